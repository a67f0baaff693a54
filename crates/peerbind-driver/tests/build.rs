//! Multi-header builds driven from a project file in a scratch directory.

use peerbind_config::ProjectConfig;
use peerbind_driver::{Driver, Include};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn project(dir: &TempDir, toml: &str) -> ProjectConfig {
    let path = dir.path().join("peerbind.toml");
    fs::write(&path, toml).unwrap();
    ProjectConfig::from_file(&path).unwrap()
}

/// Angle-bracket includes are found on the search path, relative to the project root.
#[test]
fn test_includes_resolve_on_search_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "include/api.h", "int api_version();\n");
    let config = project(
        &dir,
        r#"
[project]
name = "api"

[parse]
include_paths = ["include"]
includes = ["<api.h>"]
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let build = driver.build(&Driver::includes(&config)).unwrap();

    assert_eq!(build.files, vec![dir.path().join("include/api.h")]);
    let text = build.text();
    assert!(text.contains("// Parsed from <api.h>"), "{text}");
    assert!(text.contains("public static native int api_version();"), "{text}");
}

/// A rule learned from the first header applies to the second.
#[test]
fn test_rules_are_shared_between_headers() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "types.h", "typedef unsigned char Byte;\n");
    write(dir.path(), "io.h", "Byte read_byte();\n");
    let config = project(
        &dir,
        r#"
[project]
name = "io"

[parse]
include_paths = ["."]
includes = ["types.h", "io.h"]
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let build = driver.build(&Driver::includes(&config)).unwrap();

    assert!(build.text().contains("public static native @Cast(\"Byte\") byte read_byte();"));
    assert!(driver.info_map().get_first("Byte").is_some());
    assert_eq!(driver.source_map().len(), 2);
}

/// Excluded headers are skipped without being read.
#[test]
fn test_excluded_header_is_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.h", "void run();\n");
    let config = project(
        &dir,
        r#"
[project]
name = "main"

[parse]
include_paths = ["."]
includes = ["main.h", "missing.h"]
exclude = ["missing.h"]
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let build = driver.build(&Driver::includes(&config)).unwrap();

    assert_eq!(build.files.len(), 1);
    assert!(!build.text().contains("missing.h"));
}

/// C headers get no implicit allocating constructor.
#[test]
fn test_c_includes_parse_as_c() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "point.h", "struct Point { int x; };\n");
    write(dir.path(), "size.h", "struct Size { int w; };\n");
    let config = project(
        &dir,
        r#"
[project]
name = "geometry"

[parse]
include_paths = ["."]
includes = ["size.h"]
c_includes = ["point.h"]
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let build = driver.build(&Driver::includes(&config)).unwrap();
    let text = build.text();

    assert!(text.contains("public Size() { super((Pointer)null); allocate(); }"), "{text}");
    assert!(text.contains("public Point() { super((Pointer)null); }"), "{text}");
}

/// Rules without names contribute text ahead of every declaration.
#[test]
fn test_unnamed_rules_lead_the_output() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.h", "int a();\n");
    let config = project(
        &dir,
        r#"
[project]
name = "a"

[parse]
include_paths = ["."]
includes = ["a.h"]

[[rule]]
target_text = "// generated"
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let build = driver.build(&Driver::includes(&config)).unwrap();

    assert_eq!(build.header, vec!["// generated"]);
    assert!(build.text().starts_with("// generated\n"));
}

/// Only the configured line ranges are parsed.
#[test]
fn test_line_filter_selects_ranges() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "mixed.h",
        "int hidden();\n// BEGIN API\nint visible();\n// END API\nint also_hidden();\n",
    );
    let config = project(
        &dir,
        r#"
[project]
name = "mixed"

[parse]
include_paths = ["."]
includes = ["mixed.h"]
line_patterns = ["// BEGIN API", "// END API"]
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let text = driver.build(&Driver::includes(&config)).unwrap().text();

    assert!(text.contains("visible"));
    assert!(!text.contains("hidden"));
}

/// Parse failures carry the header path and line.
#[test]
fn test_parse_error_points_at_header() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.h", "int ok;\n)\n");

    let mut driver = Driver::default().with_search_path(vec![dir.path().to_path_buf()]);
    let err = driver.build(&[Include::cpp("<bad.h>")]).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("bad.h:2"), "{message}");
}

/// Container rules marked `define` get wrapper classes ahead of the headers.
#[test]
fn test_container_wrappers_are_generated() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "names.h", "int count();\n");
    let config = project(
        &dir,
        r#"
[project]
name = "names"

[parse]
include_paths = ["."]
includes = ["names.h"]

[[rule]]
cpp_names = ["std::vector<std::string>"]
pointer_types = ["StringVector"]
define = true
"#,
    );

    let mut driver = Driver::from_config(&config).unwrap();
    let text = driver.build(&Driver::includes(&config)).unwrap().text();

    let wrapper = text.find("class StringVector").expect("wrapper should be emitted");
    let header = text.find("// Parsed from names.h").unwrap();
    assert!(wrapper < header);
}
