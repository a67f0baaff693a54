//! Documentation comment migration.

use super::Parser;

impl Parser<'_> {
    /// Collects the comments in front of the current token, converting
    /// `///` and `//!` runs into a single `/** ... */` block. Trailing
    /// `/**<` comments belong to the previous declaration and are skipped.
    pub(crate) fn comment_before(&mut self) -> String {
        self.raw(|p| {
            while p.tokens.index > 0 && p.get_at(-1).is_comment() {
                p.tokens.index -= 1;
            }
            let mut comment = String::new();
            let mut close = false;
            let mut token = p.get();
            while token.is_comment() {
                let mut text = token.text.to_string();
                if is_doc(&text) {
                    if text.get(3..4) == Some("<") {
                        token = p.next();
                        continue;
                    } else if text.starts_with("/// ") || text.starts_with("//!") {
                        let open = comment.is_empty() || comment.contains("*/") || !comment.contains("/*");
                        text = format!("{}{}", if open { "/**" } else { " * " }, &text[3..]);
                        close = true;
                    } else if !text.starts_with("///") {
                        text = format!("/**{}", &text[3..]);
                    }
                } else if close && !comment.ends_with("*/") {
                    close = false;
                    comment.push_str(" */");
                }
                comment.push_str(&token.spacing);
                comment.push_str(&text);
                token = p.next();
            }
            if close && !comment.ends_with("*/") {
                comment.push_str(" */");
            }
            comment
        })
    }

    /// Collects `/**<` and `//!<` comments that follow a declaration on the
    /// same statement, as a documentation block.
    pub(crate) fn comment_after(&mut self) -> String {
        self.raw(|p| {
            while p.tokens.index > 0 && p.get_at(-1).is_comment() {
                p.tokens.index -= 1;
            }
            let mut comment = String::new();
            let mut token = p.get();
            while token.is_comment() {
                let text = &token.text;
                if is_doc(text) && text.get(3..4) == Some("<") {
                    let body = &text[4..];
                    if text.starts_with("/*") {
                        comment.push_str(&format!("{}/**{body}", token.spacing));
                    } else {
                        comment.push_str(&format!("{}/**{} */", token.spacing, body.trim_end()));
                    }
                }
                token = p.next();
            }
            if !comment.is_empty() && !comment.ends_with('\n') {
                comment.push('\n');
            }
            comment
        })
    }
}

fn is_doc(text: &str) -> bool {
    ["/**", "/*!", "///", "//!"].iter().any(|p| text.starts_with(p))
}

#[cfg(test)]
mod tests {
    use crate::info_map::InfoMap;
    use crate::parser::Parser;

    #[test]
    fn test_block_comment_kept() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "/** Adds. */\nint add();");
        assert_eq!(parser.comment_before(), "/** Adds. */");
        assert!(parser.get().is("int"));
    }

    #[test]
    fn test_line_comments_become_block() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "/// First.\n/// Second.\nint f();");
        assert_eq!(parser.comment_before(), "/** First.\n *  Second. */");
    }

    #[test]
    fn test_qt_style_marker() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "/*! Doc. */ int f();");
        assert_eq!(parser.comment_before(), "/** Doc. */");
    }

    #[test]
    fn test_trailing_comment() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "int x; /**< The x. */\nint y;");
        parser.next();
        parser.next();
        parser.next();
        assert!(parser.get().is("int"));
        assert_eq!(parser.comment_after(), " /** The x. */\n");
        assert_eq!(parser.comment_before(), "");
    }
}
