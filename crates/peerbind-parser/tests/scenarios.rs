//! End-to-end tests: small headers parsed with the default rule table.

use peerbind_parser::{parse_text, Context, DeclarationList, Info, InfoMap, Parser};

fn parse(map: &mut InfoMap, text: &str) -> DeclarationList {
    parse_text(map, text, &Context::new()).expect("header should parse")
}

/// A typedef makes its name resolve like the aliased type.
#[test]
fn test_typedef_alias_resolves_like_original() {
    let mut map = InfoMap::new();
    let list = parse(&mut map, "typedef int MyInt;\nMyInt x;\nint y;");

    let info = map.get_first("MyInt").expect("typedef should register a rule");
    assert_eq!(info.first_cpp_type(), Some("int"));
    assert_eq!(info.first_value_type(), Some("int"));

    let types: Vec<_> = list
        .iter()
        .filter_map(|d| d.declarator.as_ref())
        .map(|dcl| (dcl.cpp_name.as_str(), dcl.ty.target_name.as_str()))
        .collect();
    assert_eq!(types, [("x", "int"), ("y", "int")]);
}

/// Enumerators without initializers count up from zero.
#[test]
fn test_enum_constants() {
    let mut map = InfoMap::new();
    let list = parse(&mut map, "enum Color { RED, GREEN, BLUE };");
    insta::assert_snapshot!(list.text().trim(), @"/** enum Color */
public static final int RED = 0, GREEN = 1, BLUE = 2;");
}

/// Default arguments yield one overload per optional parameter.
#[test]
fn test_default_argument_overloads() {
    let mut map = InfoMap::new();
    let list = parse(&mut map, "void f(int a, float b = 1.0f);");

    assert_eq!(list.len(), 2);
    let names: Vec<_> = list
        .iter()
        .filter_map(|d| d.declarator.as_ref())
        .map(|dcl| dcl.cpp_name.as_str())
        .collect();
    assert_eq!(names, ["f", "f"], "both overloads call the same native function");
    insta::assert_snapshot!(list.text(), @"public static native void f(int a, float b/*=1.0f*/);
public static native void f(int a);");
}

/// A public base class becomes the peer class's superclass.
#[test]
fn test_derived_class_extends_base() {
    let mut map = InfoMap::new();
    let list = parse(&mut map, "class A {};\nclass B : public A {};");

    let texts: Vec<_> = list.iter().map(|d| d.text.trim()).filter(|t| !t.is_empty()).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].starts_with("public static class A extends Pointer {"));
    assert!(texts[1].starts_with("public static class B extends A {"));
}

/// Constant macros become typed constants and teach later macros their type.
#[test]
fn test_macro_constant_type_is_recorded() {
    let mut map = InfoMap::new();
    let list = parse(&mut map, "#define MAX_SIZE 1024\n#define BUFFER_SIZE (MAX_SIZE * 4)\n");

    let info = map.get_first("MAX_SIZE").expect("macro should register a rule");
    assert_eq!(info.first_cpp_type(), Some("int"));
    insta::assert_snapshot!(list.text().trim(), @"public static final int MAX_SIZE = 1024;
public static final int BUFFER_SIZE = (MAX_SIZE * 4);");
}

/// Skip rules remove a declaration without disturbing its neighbors.
#[test]
fn test_skip_rule() {
    let mut map = InfoMap::new();
    map.put(Info::new(["internal_init"]).skip(true));
    let list = parse(&mut map, "void internal_init();\nvoid public_init();");
    insta::assert_snapshot!(list.text().trim(), @"public static native void public_init();");
}

/// Rules learned from one header apply to the next one parsed with the same table.
#[test]
fn test_rules_carry_across_headers() {
    let mut map = InfoMap::new();
    parse(&mut map, "typedef unsigned char Byte;\nstruct Stream;");
    let list = parse(&mut map, "Byte read_byte(Stream* s);");
    insta::assert_snapshot!(
        list.text().trim(),
        @r#"public static native @Cast("Byte") byte read_byte(Stream s);"#
    );
}

/// Doc comments move onto the generated declaration.
#[test]
fn test_doc_comments_are_kept() {
    let mut map = InfoMap::new();
    let list = parse(&mut map, "/** Resets the device. */\nvoid reset();");
    insta::assert_snapshot!(list.text().trim(), @"/** Resets the device. */
public static native void reset();");
}

/// Anything no recognizer accepts is a hard error pointing at the token.
#[test]
fn test_garbage_is_rejected() {
    let mut map = InfoMap::new();
    let mut list = DeclarationList::new();
    let err = Parser::from_text(&mut map, "int ok;\n)")
        .parse(&Context::new(), &mut list)
        .unwrap_err();
    assert!(err.location().is_some());
    assert!(err.to_string().contains("')'"));
}
