//! Tokens produced by the [`Tokenizer`](crate::Tokenizer).

use crate::error::{ParseError, Result};
use peerbind_common::Location;
use smol_str::SmolStr;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Reserved words the parser dispatches on.
///
/// Preprocessor directive names are included: they only matter after `#`,
/// and everywhere else the parser treats keywords as plain words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Alignas,
    Class,
    Const,
    Constexpr,
    Decltype,
    Default,
    Define,
    Delete,
    Elif,
    Else,
    Endif,
    Enum,
    Explicit,
    Extern,
    Final,
    Friend,
    If,
    Ifdef,
    Ifndef,
    Include,
    Inline,
    Mutable,
    Namespace,
    Noexcept,
    Operator,
    Override,
    Private,
    Protected,
    Public,
    Static,
    StaticAssert,
    Struct,
    Template,
    ThreadLocal,
    Typedef,
    Typename,
    Undef,
    Union,
    Using,
    Virtual,
    Volatile,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "alignas" => Keyword::Alignas,
            "class" => Keyword::Class,
            "const" => Keyword::Const,
            "constexpr" => Keyword::Constexpr,
            "decltype" => Keyword::Decltype,
            "default" => Keyword::Default,
            "define" => Keyword::Define,
            "delete" => Keyword::Delete,
            "elif" => Keyword::Elif,
            "else" => Keyword::Else,
            "endif" => Keyword::Endif,
            "enum" => Keyword::Enum,
            "explicit" => Keyword::Explicit,
            "extern" => Keyword::Extern,
            "final" => Keyword::Final,
            "friend" => Keyword::Friend,
            "if" => Keyword::If,
            "ifdef" => Keyword::Ifdef,
            "ifndef" => Keyword::Ifndef,
            "include" => Keyword::Include,
            "inline" => Keyword::Inline,
            "mutable" => Keyword::Mutable,
            "namespace" => Keyword::Namespace,
            "noexcept" => Keyword::Noexcept,
            "operator" => Keyword::Operator,
            "override" => Keyword::Override,
            "private" => Keyword::Private,
            "protected" => Keyword::Protected,
            "public" => Keyword::Public,
            "static" => Keyword::Static,
            "static_assert" => Keyword::StaticAssert,
            "struct" => Keyword::Struct,
            "template" => Keyword::Template,
            "thread_local" => Keyword::ThreadLocal,
            "typedef" => Keyword::Typedef,
            "typename" => Keyword::Typename,
            "undef" => Keyword::Undef,
            "union" => Keyword::Union,
            "using" => Keyword::Using,
            "virtual" => Keyword::Virtual,
            "volatile" => Keyword::Volatile,
            _ => return None,
        };
        Some(keyword)
    }
}

/// The lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Integer,
    Float,
    String,
    Char,
    /// A comment, a backslash line continuation (text `"\n"`), or trailing
    /// whitespace at end of input (empty text).
    Comment,
    Identifier,
    Keyword(Keyword),
    /// Multi-character operator such as `::`, `->` or `##`.
    Symbol,
    /// Single punctuation character.
    Punct,
    Eof,
}

/// A lexed token together with the whitespace that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    /// Whitespace between the previous token and this one, kept verbatim.
    pub spacing: SmolStr,
    pub file: Option<Arc<Path>>,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            text: text.into(),
            spacing: SmolStr::default(),
            file: None,
            line: 0,
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }

    pub fn with_spacing(mut self, spacing: impl Into<SmolStr>) -> Self {
        self.spacing = spacing.into();
        self
    }

    pub fn at(mut self, location: &Location) -> Self {
        self.file = location.file.clone();
        self.line = location.line;
        self
    }

    /// Compares the token text, whatever its kind.
    pub fn is(&self, text: &str) -> bool {
        self.kind != TokenKind::Eof && self.text == text
    }

    pub fn is_any(&self, texts: &[&str]) -> bool {
        texts.iter().any(|t| self.is(t))
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_any_keyword(&self, keywords: &[Keyword]) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if keywords.contains(&k))
    }

    /// Identifiers and reserved words alike.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword(_))
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind, TokenKind::Integer | TokenKind::Char)
    }

    /// The comment token standing in for a backslash-newline.
    pub fn is_continuation(&self) -> bool {
        self.kind == TokenKind::Comment && self.text == "\n"
    }

    pub fn location(&self) -> Location {
        Location::new(self.file.clone(), self.line)
    }

    /// Fails with an "unexpected token" error unless the text matches one of `texts`.
    pub fn expect(&self, texts: &[&str]) -> Result<&Self> {
        if self.is_any(texts) {
            Ok(self)
        } else {
            Err(self.unexpected())
        }
    }

    pub fn expect_word(&self) -> Result<&Self> {
        if self.is_word() {
            Ok(self)
        } else {
            Err(self.unexpected())
        }
    }

    pub fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            location: self.location(),
            token: self.describe(),
        }
    }

    /// Token text for diagnostics, with a readable marker for end of input.
    pub fn describe(&self) -> String {
        if self.is_eof() {
            "EOF".to_string()
        } else {
            self.text.to_string()
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::from_word("typedef"), Some(Keyword::Typedef));
        assert_eq!(Keyword::from_word("static_assert"), Some(Keyword::StaticAssert));
        assert_eq!(Keyword::from_word("size_t"), None);
    }

    #[test]
    fn test_matching() {
        let tok = Token::new(TokenKind::Keyword(Keyword::Const), "const");
        assert!(tok.is("const"));
        assert!(tok.is_word());
        assert!(!tok.is_ident());
        assert!(tok.is_any_keyword(&[Keyword::Static, Keyword::Const]));
        assert!(!Token::eof().is(""));
    }

    #[test]
    fn test_expect_reports_location() {
        let tok = Token::new(TokenKind::Punct, "}").at(&Location::fragment(7));
        let err = tok.expect(&[";"]).unwrap_err();
        assert_eq!(err.to_string(), "<fragment>:7: Unexpected token '}'");
    }
}
