//! Lexer for C/C++ header text.
//!
//! Whitespace is never dropped: it is attached to the following token as its
//! `spacing`, and whitespace at the end of input becomes an empty comment
//! token, so concatenating `spacing + text` over all tokens reproduces the
//! input. Comments are kept as tokens for documentation migration.

use crate::token::{Keyword, Token, TokenKind};
use peerbind_common::Location;
use regex::Regex;
use smol_str::SmolStr;
use std::path::Path;
use std::sync::Arc;

pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    file: Option<Arc<Path>>,
    line: u32,
    count_lines: bool,
    line_separator: Option<&'static str>,
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        let line_separator = text.find(['\r', '\n']).map(|i| {
            let rest = &text[i..];
            if rest.starts_with("\r\n") {
                "\r\n"
            } else if rest.starts_with('\r') {
                "\r"
            } else {
                "\n"
            }
        });
        let chars = if text.contains('\r') {
            text.replace("\r\n", "\n").replace('\r', "\n").chars().collect()
        } else {
            text.chars().collect()
        };

        Self {
            chars,
            pos: 0,
            file: None,
            line: 1,
            count_lines: true,
            line_separator,
        }
    }

    pub fn with_file(mut self, file: Arc<Path>) -> Self {
        self.file = Some(file);
        self
    }

    /// Attribute every token to a fixed location. Used for text fragments
    /// built while parsing, so diagnostics point at the originating line.
    pub fn at(mut self, location: &Location) -> Self {
        self.file = location.file.clone();
        self.line = location.line;
        self.count_lines = false;
        self
    }

    /// The first line terminator seen in the input, if any.
    pub fn line_separator(&self) -> Option<&'static str> {
        self.line_separator
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' && self.count_lines {
            self.line += 1;
        }
        Some(c)
    }

    fn next_token(&mut self) -> Option<Token> {
        let mut spacing = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            spacing.push(c);
            self.bump();
        }
        let line = self.line;

        let Some(c) = self.bump() else {
            if spacing.is_empty() {
                return None;
            }
            return Some(self.make(TokenKind::Comment, String::new(), spacing, line));
        };

        let (kind, text) = if c.is_alphabetic() || c == '_' {
            self.word(c)
        } else if c.is_ascii_digit() || (c == '.' && self.peek().is_some_and(|n| n.is_ascii_digit())) {
            self.number(c)
        } else {
            match c {
                '"' => (TokenKind::String, self.quoted('"')),
                '\'' => (TokenKind::Char, self.quoted('\'')),
                '/' if self.peek() == Some('/') => (TokenKind::Comment, self.line_comment()),
                '/' if self.peek() == Some('*') => (TokenKind::Comment, self.block_comment()),
                '\\' if self.peek() == Some('\n') => {
                    self.bump();
                    (TokenKind::Comment, "\n".to_string())
                }
                '.' if self.peek() == Some('.') && self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    (TokenKind::Symbol, "...".to_string())
                }
                _ => self.operator(c),
            }
        };
        Some(self.make(kind, text, spacing, line))
    }

    fn make(&self, kind: TokenKind, text: String, spacing: String, line: u32) -> Token {
        Token {
            kind,
            text: SmolStr::from(text),
            spacing: SmolStr::from(spacing),
            file: self.file.clone(),
            line,
        }
    }

    fn word(&mut self, first: char) -> (TokenKind, String) {
        let mut text = String::from(first);
        while let Some(c) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
            text.push(c);
            self.bump();
        }
        let kind = Keyword::from_word(&text).map_or(TokenKind::Identifier, TokenKind::Keyword);
        (kind, text)
    }

    /// Lenient numeric literal scan. Integer suffixes are dropped, and a
    /// trailing `L` is added when the value needs 64 bits.
    fn number(&mut self, first: char) -> (TokenKind, String) {
        let mut kind = if first == '.' { TokenKind::Float } else { TokenKind::Integer };
        let mut text = String::from(first);
        let (mut exp, mut large, mut unsigned, mut hex) = (false, false, false, false);
        let mut prev = first;
        while let Some(c) = self.peek() {
            let sign = matches!(c, '+' | '-')
                && ((!hex && matches!(prev, 'e' | 'E')) || (hex && matches!(prev, 'p' | 'P')));
            let accepted = c.is_ascii_digit()
                || c == '.'
                || sign
                || c.is_ascii_hexdigit()
                || matches!(c, 'l' | 'L' | 'u' | 'U' | 'x' | 'X' | 'i' | 'I' | 'p' | 'P');
            if !accepted {
                break;
            }
            self.bump();
            match c {
                '.' => kind = TokenKind::Float,
                'e' | 'E' if !hex => exp = true,
                'p' | 'P' => exp = true,
                'l' | 'L' => large = true,
                'u' | 'U' => unsigned = true,
                'x' | 'X' => hex = true,
                _ => {}
            }
            if !matches!(c, 'l' | 'L' | 'u' | 'U') {
                text.push(c);
            }
            prev = c;
        }
        if !hex && (exp || matches!(prev, 'f' | 'F')) {
            kind = TokenKind::Float;
        }
        if kind == TokenKind::Integer && !large {
            match decode_integer(&text) {
                Some(value) => {
                    let high = value >> 32;
                    large = high != 0 && high != -1;
                }
                None => large = text.len() >= 16,
            }
        }
        if let Some(stripped) = text.strip_suffix("i64") {
            text = stripped.to_string();
            large = true;
        }
        if kind == TokenKind::Integer && (large || (unsigned && !hex)) {
            text.push('L');
        }
        (kind, text)
    }

    fn quoted(&mut self, quote: char) -> String {
        let mut text = String::from(quote);
        while let Some(c) = self.bump() {
            text.push(c);
            if c == quote {
                return text;
            }
            if c == '\\' {
                if let Some(escaped) = self.bump() {
                    text.push(escaped);
                }
            }
        }
        text.push(quote);
        text
    }

    fn line_comment(&mut self) -> String {
        let mut text = String::from("/");
        let mut prev = '/';
        while let Some(c) = self.peek() {
            if c == '\n' && prev != '\\' {
                break;
            }
            text.push(c);
            self.bump();
            prev = c;
        }
        text
    }

    fn block_comment(&mut self) -> String {
        let mut text = String::from("/");
        text.push('*');
        self.bump();
        let mut prev = '\0';
        while let Some(c) = self.bump() {
            text.push(c);
            if prev == '*' && c == '/' {
                return text;
            }
            prev = c;
        }
        text
    }

    /// Punctuation. `>` never combines with what follows so that nested
    /// template argument lists close one level at a time.
    fn operator(&mut self, c: char) -> (TokenKind, String) {
        let next = self.peek();
        let pair: Option<&str> = match (c, next) {
            (':', Some(':')) => Some("::"),
            ('#', Some('#')) => Some("##"),
            ('-', Some('>')) => Some("->"),
            ('-', Some('-')) => Some("--"),
            ('-', Some('=')) => Some("-="),
            ('+', Some('+')) => Some("++"),
            ('+', Some('=')) => Some("+="),
            ('&', Some('&')) => Some("&&"),
            ('&', Some('=')) => Some("&="),
            ('|', Some('|')) => Some("||"),
            ('|', Some('=')) => Some("|="),
            ('=', Some('=')) => Some("=="),
            ('!', Some('=')) => Some("!="),
            ('<', Some('<')) => Some("<<"),
            ('<', Some('=')) => Some("<="),
            ('*', Some('=')) => Some("*="),
            ('/', Some('=')) => Some("/="),
            ('%', Some('=')) => Some("%="),
            ('^', Some('=')) => Some("^="),
            _ => None,
        };
        match pair {
            Some("<<") if self.peek_at(1) == Some('=') => {
                self.pos += 2;
                (TokenKind::Symbol, "<<=".to_string())
            }
            Some(symbol) => {
                self.bump();
                (TokenKind::Symbol, symbol.to_string())
            }
            None => (TokenKind::Punct, c.to_string()),
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Decode an integer literal the way `#define` values are usually written:
/// decimal, `0x` hexadecimal, or leading-zero octal.
pub(crate) fn decode_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Keeps or drops ranges of lines delimited by pairs of patterns.
///
/// Patterns come in (begin, end) pairs and must match a whole line. A
/// begin match opens a range that runs through the next line matching the
/// paired end pattern. In keep mode only those ranges survive; in skip mode
/// they are removed.
#[derive(Debug, Clone)]
pub struct LineFilter {
    patterns: Vec<Regex>,
    skip: bool,
}

impl LineFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S], skip: bool) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("^(?:{})$", p.as_ref())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns, skip })
    }

    pub fn apply(&self, text: &str) -> String {
        let mut out = String::new();
        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            let begin = (0..self.patterns.len())
                .step_by(2)
                .find(|&i| self.patterns[i].is_match(line));
            let Some(i) = begin else {
                if self.skip {
                    out.push_str(line);
                    out.push('\n');
                }
                continue;
            };
            if !self.skip {
                out.push_str(line);
                out.push('\n');
            }
            let Some(end) = self.patterns.get(i + 1) else {
                continue;
            };
            for line in lines.by_ref() {
                if !self.skip {
                    out.push_str(line);
                    out.push('\n');
                }
                if end.is_match(line) {
                    break;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(text: &str) -> Vec<(TokenKind, String)> {
        Tokenizer::new(text)
            .tokenize()
            .into_iter()
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn test_spacing_round_trip() {
        let text = "  /** doc */\nint  foo(const char *s, ...); // trailing\n\n";
        let tokens = Tokenizer::new(text).tokenize();
        let rebuilt: String = tokens.iter().map(|t| format!("{}{}", t.spacing, t.text)).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_keywords_and_symbols() {
        let tokens = kinds_and_texts("std::vector<int>&& x -> y");
        assert_eq!(tokens[0], (TokenKind::Identifier, "std".to_string()));
        assert_eq!(tokens[1], (TokenKind::Symbol, "::".to_string()));
        assert_eq!(tokens[5], (TokenKind::Punct, ">".to_string()));
        assert_eq!(tokens[6], (TokenKind::Symbol, "&&".to_string()));
        assert_eq!(tokens[8], (TokenKind::Symbol, "->".to_string()));

        let tokens = kinds_and_texts("const typedef");
        assert_eq!(tokens[0].0, TokenKind::Keyword(Keyword::Const));
        assert_eq!(tokens[1].0, TokenKind::Keyword(Keyword::Typedef));
    }

    #[test]
    fn test_nested_template_closers_stay_separate() {
        let tokens = kinds_and_texts("a<b<c>>");
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, ["a", "<", "b", "<", "c", ">", ">"]);
    }

    #[test]
    fn test_integer_suffixes() {
        assert_eq!(kinds_and_texts("1024")[0], (TokenKind::Integer, "1024".to_string()));
        assert_eq!(kinds_and_texts("10UL")[0], (TokenKind::Integer, "10L".to_string()));
        assert_eq!(kinds_and_texts("10u")[0], (TokenKind::Integer, "10L".to_string()));
        assert_eq!(kinds_and_texts("0xFFu")[0], (TokenKind::Integer, "0xFF".to_string()));
        assert_eq!(kinds_and_texts("4294967296")[0], (TokenKind::Integer, "4294967296L".to_string()));
        assert_eq!(kinds_and_texts("12i64")[0], (TokenKind::Integer, "12L".to_string()));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(kinds_and_texts("1.0f")[0], (TokenKind::Float, "1.0f".to_string()));
        assert_eq!(kinds_and_texts("1e-5")[0], (TokenKind::Float, "1e-5".to_string()));
        assert_eq!(kinds_and_texts(".5")[0], (TokenKind::Float, ".5".to_string()));
        let tokens = kinds_and_texts("0x1e-1");
        assert_eq!(tokens[0], (TokenKind::Integer, "0x1e".to_string()));
    }

    #[test]
    fn test_literals_and_comments() {
        let tokens = kinds_and_texts(r#""a\"b" 'c' // note"#);
        assert_eq!(tokens[0], (TokenKind::String, r#""a\"b""#.to_string()));
        assert_eq!(tokens[1], (TokenKind::Char, "'c'".to_string()));
        assert_eq!(tokens[2], (TokenKind::Comment, "// note".to_string()));
    }

    #[test]
    fn test_line_continuation_and_lines() {
        let tokens = Tokenizer::new("#define A \\\n  1\nint b;").tokenize();
        assert!(tokens[3].is_continuation());
        let int = tokens.iter().find(|t| t.is("int")).unwrap();
        assert_eq!(int.line, 3);
    }

    #[test]
    fn test_line_separator_detection() {
        let mut tokenizer = Tokenizer::new("int a;\r\nint b;\r\n");
        let tokens = tokenizer.tokenize();
        assert_eq!(tokenizer.line_separator(), Some("\r\n"));
        assert_eq!(tokens[3].line, 2);
        assert_eq!(Tokenizer::new("int a;").line_separator(), None);
    }

    #[test]
    fn test_fragment_keeps_line() {
        let location = Location::fragment(12);
        let tokens = Tokenizer::new("int\nx").at(&location).tokenize();
        assert!(tokens.iter().all(|t| t.line == 12));
    }

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode_integer("0x10"), Some(16));
        assert_eq!(decode_integer("010"), Some(8));
        assert_eq!(decode_integer("-3"), Some(-3));
        assert_eq!(decode_integer("1.5"), None);
    }

    #[test]
    fn test_line_filter_keep_and_skip() {
        let text = "a\n#if WIN\nb\n#endif\nc\n";
        let patterns = ["#if WIN", "#endif"];
        let keep = LineFilter::new(&patterns, false).unwrap();
        assert_eq!(keep.apply(text), "#if WIN\nb\n#endif\n");
        let skip = LineFilter::new(&patterns, true).unwrap();
        assert_eq!(skip.apply(text), "a\nc\n");
    }
}
