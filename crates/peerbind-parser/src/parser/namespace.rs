use super::Parser;
use crate::ast::Declaration;
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;
use crate::token::{Keyword, TokenKind};
use tracing::debug;

impl Parser<'_> {
    /// Recognizes `namespace a::b { ... }` and parses its members with the
    /// namespace appended to the context. Anonymous namespaces have internal
    /// linkage and are skipped; inline namespaces are transparent.
    pub(crate) fn namespace(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let inline = self.get().is_keyword(Keyword::Inline) && self.get_at(1).is_keyword(Keyword::Namespace);
        if inline {
            self.next();
        }
        if !self.get().is_keyword(Keyword::Namespace) {
            return Ok(false);
        }
        let spacing = self.get().spacing.to_string();

        let mut name = String::new();
        let mut token = self.next();
        while token.is_word() || token.is("::") {
            name.push_str(&token.text);
            token = self.next();
        }
        if token.is("=") {
            // namespace alias
            self.skip_statement();
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }
        token.expect(&["{"])?;
        if name.is_empty() {
            debug!(line = token.line, "skipped anonymous namespace");
            self.body();
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }
        self.next();

        let mut scope = context.clone();
        if !inline {
            let name = name.trim_start_matches("::");
            scope.namespace = Some(match &context.namespace {
                Some(outer) => format!("{outer}::{name}"),
                None => name.to_string(),
            });
        }
        self.declarations(scope, list)?;
        let closing = self.get();
        closing.expect(&["}"])?;
        self.next();
        list.add(Declaration::with_text(closing.spacing.to_string()), self.info_map);
        Ok(true)
    }

    /// Recognizes a linkage specification, `extern "C" { ... }` or
    /// `extern "C" declaration`, whose members belong to the enclosing scope.
    pub(crate) fn extern_block(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        if !self.get().is_keyword(Keyword::Extern) || self.get_at(1).kind != TokenKind::String {
            return Ok(false);
        }
        let linkage = self.next();
        linkage.expect(&["\"C\"", "\"C++\""])?;
        if !self.next().is("{") {
            // the declaration that follows is parsed on its own
            list.add(Declaration::new(), self.info_map);
            return Ok(true);
        }
        self.next();

        self.declarations(context.clone(), list)?;
        self.get().expect(&["}"])?;
        self.next();
        list.add(Declaration::new(), self.info_map);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info_map::InfoMap;

    fn parse(map: &mut InfoMap, text: &str) -> String {
        let mut list = DeclarationList::new();
        Parser::from_text(map, text).parse(&Context::new(), &mut list).unwrap();
        list.text()
    }

    #[test]
    fn test_namespace_members_are_annotated() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "namespace gfx {\nvoid draw();\n}");
        assert_eq!(text.trim(), "@Namespace(\"gfx\") public static native void draw();");
    }

    #[test]
    fn test_nested_namespaces() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "namespace a { namespace b { int f(); } }\nnamespace a::c { int g(); }");
        assert!(text.contains("@Namespace(\"a::b\") public static native int f();"), "{text}");
        assert!(text.contains("@Namespace(\"a::c\") public static native int g();"), "{text}");
    }

    #[test]
    fn test_anonymous_namespace_is_skipped() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "namespace { int hidden(); }\nint shown();");
        assert!(!text.contains("hidden"));
        assert!(text.contains("public static native int shown();"));
    }

    #[test]
    fn test_inline_namespace_is_transparent() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "namespace lib { inline namespace v2 { int version(); } }");
        assert!(text.contains("@Namespace(\"lib\") public static native int version();"), "{text}");
    }

    #[test]
    fn test_namespace_alias_ignored() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "namespace fs = std::filesystem;\nint f();");
        assert_eq!(text.trim(), "public static native int f();");
    }

    #[test]
    fn test_extern_c_block() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "extern \"C\" {\nint open_db(const char* path);\n}");
        assert_eq!(
            text.trim(),
            "public static native int open_db(@Cast(\"const char*\") BytePointer path);\npublic static native int open_db(String path);"
        );
    }

    #[test]
    fn test_extern_c_single_declaration() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, "extern \"C\" void reset();");
        assert_eq!(text.trim(), "public static native void reset();");
    }

    #[test]
    fn test_unclosed_namespace_is_an_error() {
        let mut map = InfoMap::new();
        let mut list = DeclarationList::new();
        let result = Parser::from_text(&mut map, "namespace a { int f();").parse(&Context::new(), &mut list);
        assert!(result.is_err());
    }

    #[test]
    fn test_unclosed_scope_error_points_at_end_of_file() {
        let file: std::sync::Arc<std::path::Path> = std::sync::Arc::from(std::path::Path::new("net.h"));
        for text in ["namespace n {\n  int f();\n", "enum E {", "void f(int a = (1"] {
            let mut map = InfoMap::new();
            let mut list = DeclarationList::new();
            let tokens = crate::tokenizer::Tokenizer::new(text)
                .with_file(std::sync::Arc::clone(&file))
                .tokenize();
            let err = Parser::new(&mut map, tokens).parse(&Context::new(), &mut list).unwrap_err();
            let location = err.location().cloned().unwrap_or_default();
            assert_eq!(location.file.as_deref(), Some(&*file), "{text}: {err}");
            assert_eq!(location.line, text.matches('\n').count() as u32 + 1, "{text}: {err}");
        }
    }
}
