//! Header builds: include resolution, one shared rule table per build, and
//! the assembled peer-class text.

use miette::Result;
use peerbind_common::{Diagnostic, Dialect, SourceMap};
use peerbind_config::ProjectConfig;
use peerbind_parser::{Context, Declaration, DeclarationList, InfoMap, LineFilter, ParseError, Parser, Tokenizer};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A header to parse, as named in the project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// `<name>` searches only the include path; anything else is tried as
    /// a path first.
    pub name: String,
    pub dialect: Dialect,
}

impl Include {
    pub fn cpp(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dialect: Dialect::Cpp,
        }
    }

    pub fn c(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dialect: Dialect::C,
        }
    }
}

/// Result of a build.
#[derive(Debug, Clone, Serialize)]
pub struct Build {
    /// Text of the rules without names, emitted ahead of all declarations.
    pub header: Vec<String>,
    pub declarations: Vec<Declaration>,
    /// Headers actually parsed, in order.
    pub files: Vec<PathBuf>,
    /// Line terminator of the first header parsed.
    pub line_separator: String,
    pub warnings: Vec<String>,
}

impl Build {
    /// The header lines followed by every declaration, using the line
    /// terminator of the input.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.header {
            text.push_str(line);
            text.push('\n');
        }
        for decl in &self.declarations {
            text.push_str(&decl.text);
        }
        if self.line_separator != "\n" {
            text = text.replace('\n', &self.line_separator);
        }
        text
    }
}

/// Orchestrates the parse of a list of headers.
///
/// The rule table is threaded through every header in order, so rules
/// learned from one header apply to all that follow.
pub struct Driver {
    info_map: InfoMap,
    search_path: Vec<PathBuf>,
    line_filter: Option<LineFilter>,
    source_map: SourceMap,
    warnings: Vec<Diagnostic>,
}

impl Driver {
    pub fn new(info_map: InfoMap) -> Self {
        Self {
            info_map,
            search_path: Vec::new(),
            line_filter: None,
            source_map: SourceMap::new(),
            warnings: Vec::new(),
        }
    }

    /// A driver set up with the rules, search path and line filter of `config`.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        Ok(Self::new(config.info_map())
            .with_search_path(config.search_path())
            .with_line_filter(config.line_filter()?))
    }

    pub fn with_search_path(mut self, search_path: Vec<PathBuf>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_line_filter(mut self, line_filter: Option<LineFilter>) -> Self {
        self.line_filter = line_filter;
        self
    }

    /// The headers of `config`: C++ includes first, then C includes.
    pub fn includes(config: &ProjectConfig) -> Vec<Include> {
        let cpp = config.parse.includes.iter().map(Include::cpp);
        let c = config.parse.c_includes.iter().map(Include::c);
        cpp.chain(c).collect()
    }

    /// Finds the file for an include name.
    pub fn resolve(&self, include: &str) -> Option<PathBuf> {
        let name = match include.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            Some(name) => name,
            None => {
                let direct = PathBuf::from(include);
                if direct.is_file() {
                    return Some(direct);
                }
                include
            }
        };
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Parses `includes` in order into one declaration list.
    pub fn build(&mut self, includes: &[Include]) -> Result<Build> {
        let mut list = DeclarationList::new();
        let mut files = Vec::new();
        let mut line_separator = None;

        let mut parser = Parser::new(&mut self.info_map, Vec::new());
        parser.containers(&Context::new(), &mut list)?;
        self.warnings.extend(parser.take_warnings());

        for include in includes {
            let Some((path, separator)) = self.parse_include(include, &mut list)? else {
                continue;
            };
            files.push(path);
            line_separator = line_separator.or(separator);
        }

        let header = self
            .info_map
            .unnamed()
            .iter()
            .filter_map(|info| info.target_text.clone())
            .collect();
        Ok(Build {
            header,
            declarations: list.into_vec(),
            files,
            line_separator: line_separator.unwrap_or("\n").to_string(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        })
    }

    /// Parses one header into `list`. Returns `None` when a skip rule
    /// names the file.
    fn parse_include(
        &mut self,
        include: &Include,
        list: &mut DeclarationList,
    ) -> Result<Option<(PathBuf, Option<&'static str>)>> {
        let path = self.resolve(&include.name).unwrap_or_else(|| {
            let name = include.name.trim_start_matches('<').trim_end_matches('>');
            PathBuf::from(name)
        });
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.info_map.get_first(&file_name).is_some_and(|info| info.skip) {
            warn!(include = %include.name, "skipping include");
            return Ok(None);
        }
        if !path.is_file() {
            return Err(ParseError::MissingInclude { path }.into());
        }

        info!(path = %path.display(), dialect = ?include.dialect, "Parsing");
        let content = std::fs::read_to_string(&path)
            .map_err(|source| ParseError::Io {
                path: path.clone(),
                source,
            })?;
        let content = match &self.line_filter {
            Some(filter) => filter.apply(&content),
            None => content,
        };
        let id = self.source_map.add_file(&path, content, include.dialect);
        let Some(source) = self.source_map.get(id) else {
            return Ok(None);
        };

        let mut tokenizer = Tokenizer::new(&source.content).with_file(Arc::clone(&source.path));
        let tokens = tokenizer.tokenize();
        let context = match include.dialect {
            Dialect::C => Context::c_only(),
            Dialect::Cpp => Context::new(),
        };

        list.add(Declaration::comment(format!("\n// Parsed from {}\n\n", include.name)), &self.info_map);
        let mut parser = Parser::new(&mut self.info_map, tokens);
        let result = parser.parse(&context, list);
        let warnings = parser.take_warnings();
        for warning in &warnings {
            warn!("{warning}");
        }
        self.warnings.extend(warnings);
        result?;
        list.add(Declaration::comment("\n"), &self.info_map);
        debug!(path = %path.display(), declarations = list.len(), "parsed");

        Ok(Some((path, tokenizer.line_separator())))
    }

    /// The rule table, including every rule learned so far.
    pub fn info_map(&self) -> &InfoMap {
        &self.info_map
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(InfoMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_header_file() {
        let mut file = NamedTempFile::with_suffix(".h").unwrap();
        writeln!(file, "int answer();").unwrap();

        let mut driver = Driver::default();
        let path = file.path().to_string_lossy().into_owned();
        let build = driver.build(&[Include::cpp(path.clone())]).unwrap();

        assert_eq!(build.files, vec![file.path().to_path_buf()]);
        let text = build.text();
        assert!(text.contains(&format!("// Parsed from {path}")));
        assert!(text.contains("public static native int answer();"));
    }

    #[test]
    fn test_missing_include_is_an_error() {
        let mut driver = Driver::default();
        let err = driver.build(&[Include::cpp("<does_not_exist.h>")]).unwrap_err();
        assert!(err.to_string().contains("does_not_exist.h"));
    }

    #[test]
    fn test_line_separator_is_preserved() {
        let mut file = NamedTempFile::with_suffix(".h").unwrap();
        write!(file, "int a;\r\nint b;\r\n").unwrap();

        let mut driver = Driver::default();
        let build = driver
            .build(&[Include::cpp(file.path().to_string_lossy())])
            .unwrap();

        assert_eq!(build.line_separator, "\r\n");
        let text = build.text();
        assert!(!text.replace("\r\n", "").contains('\n'));
    }
}
