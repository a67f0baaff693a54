//! Seekable token cursor with on-demand preprocessing.

use crate::info::Info;
use crate::info_map::InfoMap;
use crate::token::{Keyword, Token, TokenKind};
use crate::tokenizer::Tokenizer;
use peerbind_common::Location;
use std::sync::Arc;

const CONDITIONALS: [Keyword; 3] = [Keyword::If, Keyword::Ifdef, Keyword::Ifndef];
const DIRECTIVES: [Keyword; 6] = [
    Keyword::If,
    Keyword::Ifdef,
    Keyword::Ifndef,
    Keyword::Elif,
    Keyword::Else,
    Keyword::Endif,
];

/// Cursor over a token array.
///
/// `index` is public: recognizers save it before a speculative parse and
/// restore it on failure. Outside raw mode, comment tokens are invisible and
/// every visited position is preprocessed first, which may rewrite the array
/// from that position on. Positions before `index` are never rewritten, so a
/// saved index stays valid.
#[derive(Debug, Clone, Default)]
pub struct TokenIndexer {
    array: Vec<Token>,
    pub index: usize,
    /// Disables preprocessing and exposes comments.
    pub raw: bool,
}

impl TokenIndexer {
    pub fn new(array: Vec<Token>) -> Self {
        Self {
            array,
            index: 0,
            raw: false,
        }
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// The token `i` visible positions away from `index`. Negative offsets
    /// are only meaningful in raw mode.
    pub fn get(&mut self, i: isize, info_map: &InfoMap) -> Token {
        let k = self.position(i, info_map);
        self.array.get(k).cloned().unwrap_or_else(|| self.end())
    }

    /// Advances past the current token and returns the new current one.
    pub fn next(&mut self, info_map: &InfoMap) -> Token {
        self.index = self.position(1, info_map);
        self.array.get(self.index).cloned().unwrap_or_else(|| self.end())
    }

    /// The end-of-input token, placed on the last line of the input so
    /// errors at the end still point into the file.
    fn end(&self) -> Token {
        match self.array.last() {
            Some(last) => {
                let line = last.line + last.text.matches('\n').count() as u32;
                Token::eof().at(&Location::new(last.file.clone(), line))
            }
            None => Token::eof(),
        }
    }

    /// Array position of the token `i` visible positions away from `index`.
    fn position(&mut self, i: isize, info_map: &InfoMap) -> usize {
        if self.raw {
            self.index.saturating_add_signed(i)
        } else {
            self.preprocess(self.index, i.max(0), info_map)
        }
    }

    /// Replaces the spacing of the token `i` positions away.
    pub fn set_spacing(&mut self, i: isize, spacing: &str, info_map: &InfoMap) {
        let k = self.position(i, info_map);
        if let Some(token) = self.array.get_mut(k) {
            token.spacing = spacing.into();
        }
    }

    fn preprocess(&mut self, mut index: usize, mut count: isize, info_map: &InfoMap) -> usize {
        while index < self.array.len() {
            self.filter(index, info_map);
            self.expand(index, info_map);
            let Some(token) = self.array.get(index) else {
                break;
            };
            if !token.is_comment() {
                count -= 1;
                if count < 0 {
                    break;
                }
            }
            index += 1;
        }
        self.filter(index, info_map);
        self.expand(index, info_map);
        index
    }

    /// Resolves an `#if`/`#ifdef`/`#ifndef` block starting at `index`.
    ///
    /// Conditions are looked up in the rule table and decided by the `define`
    /// flag; literal integers are evaluated; anything else keeps every
    /// branch. Directives survive as line comments.
    fn filter(&mut self, index: usize, info_map: &InfoMap) {
        let len = self.array.len();
        if index + 1 >= len
            || !self.array[index].is("#")
            || !self.array[index + 1].is_any_keyword(&CONDITIONALS)
        {
            return;
        }

        let mut tokens: Vec<Token> = Vec::with_capacity(len);
        tokens.extend_from_slice(&self.array[..index]);
        let mut index = index;
        let mut count = 0;
        let mut info: Option<Arc<Info>> = None;
        let (mut define, mut defined) = (true, false);
        while index < len {
            let spacing = self.array[index].spacing.clone();
            let n = spacing.rfind('\n').map_or(0, |i| i + 1);
            let mut keyword = None;
            if self.array[index].is("#") && index + 1 < len {
                let next = &self.array[index + 1];
                if next.is_any_keyword(&CONDITIONALS) {
                    count += 1;
                }
                if count == 1 && next.is_any_keyword(&DIRECTIVES) {
                    keyword = Some(next.clone());
                }
                if next.is_keyword(Keyword::Endif) {
                    count -= 1;
                }
            }

            let Some(keyword) = keyword else {
                if define {
                    tokens.push(self.array[index].clone());
                }
                index += 1;
                defined |= define;
                continue;
            };

            let location = self.array[index].location();
            index += 2;
            let mut text = format!("// {}#{}{}", &spacing[n..], keyword.spacing, keyword.text);
            if keyword.is_any_keyword(&[Keyword::If, Keyword::Ifdef, Keyword::Ifndef, Keyword::Elif]) {
                let mut value = String::new();
                while let Some(token) = self.array.get(index) {
                    if token.spacing.contains('\n') {
                        break;
                    }
                    if !token.is_comment() {
                        value.push_str(&token.spacing);
                        value.push_str(&token.text);
                    }
                    if token.is_continuation() {
                        text.push_str("\n// ");
                    } else {
                        text.push_str(&token.spacing);
                        text.push_str(&token.text);
                    }
                    index += 1;
                }
                define = info.is_none() || !defined;
                info = if value.trim().is_empty() { None } else { info_map.get_first(&value) };
                if let Some(info) = &info {
                    define = if keyword.is_keyword(Keyword::Ifndef) { !info.define } else { info.define };
                } else if let Some(v) = crate::tokenizer::decode_integer(value.trim()) {
                    define = v != 0;
                }
            } else if keyword.is_keyword(Keyword::Else) {
                define = info.is_none() || !define;
            }

            let mut comment = Token::new(TokenKind::Comment, text).at(&location);
            comment.spacing = spacing[..n].into();
            tokens.push(comment);
            if keyword.is_keyword(Keyword::Endif) && count == 0 {
                break;
            }
            defined |= define;
        }
        tokens.extend_from_slice(&self.array[index.min(len)..]);
        self.array = tokens;
    }

    /// Expands the macro invocation at `index`, if the first rule for the
    /// word there carries `#define` text for it.
    fn expand(&mut self, index: usize, info_map: &InfoMap) {
        let Some(token) = self.array.get(index) else {
            return;
        };
        if !token.is_word() || !info_map.contains_key(&token.text) {
            return;
        }
        let Some(info) = info_map.get_first(&token.text) else {
            return;
        };
        let Some(cpp_text) = info.cpp_text.as_deref() else {
            return;
        };
        let location = token.location();
        let mut body = Tokenizer::new(cpp_text)
            .at(&location)
            .filter(|t| !(t.is_comment() && t.text.is_empty()));
        let header_ok = body.next().is_some_and(|t| t.is("#"))
            && body.next().is_some_and(|t| t.is_keyword(Keyword::Define))
            && body.next().is_some_and(|t| t.is(info.first_cpp_name()));
        if !header_ok {
            return;
        }

        let start = index;
        let mut end = index;
        let mut name = token.text.to_string();
        let mut params: Vec<String> = Vec::new();
        let mut args: Vec<Vec<Token>> = Vec::new();
        let mut next = body.next();
        if next.as_ref().is_some_and(|t| t.is("(") && t.spacing.is_empty()) {
            next = body.next();
            while let Some(t) = next.take() {
                if t.is(")") {
                    next = body.next();
                    break;
                } else if t.is_word() {
                    params.push(t.text.to_string());
                } else if t.is("...") {
                    params.push("__VA_ARGS__".to_string());
                }
                next = body.next();
            }
            end += 1;
            if !self.array.get(end).is_some_and(|t| t.is("(")) {
                return;
            }
            let open = &self.array[end];
            name.push_str(&open.spacing);
            name.push_str(&open.text);
            args.resize(params.len(), Vec::new());
            let variadic = params.last().is_some_and(|p| p == "__VA_ARGS__");
            let (mut count, mut depth) = (0usize, 0i32);
            end += 1;
            while let Some(t) = self.array.get(end) {
                name.push_str(&t.spacing);
                name.push_str(&t.text);
                if depth == 0 && t.is(")") {
                    break;
                } else if depth == 0 && t.is(",") && !(variadic && count + 1 >= params.len()) {
                    count += 1;
                    end += 1;
                    continue;
                } else if t.is_any(&["(", "[", "{"]) {
                    depth += 1;
                } else if t.is_any(&[")", "]", "}"]) {
                    depth -= 1;
                }
                if let Some(arg) = args.get_mut(count) {
                    arg.push(t.clone());
                }
                end += 1;
            }
        }

        let skip = info_map.get_first(&name).is_some_and(|i| i.skip);
        let mut expansion: Vec<Token> = Vec::new();
        if !skip {
            while let Some(t) = next {
                match params.iter().position(|p| t.is(p)) {
                    Some(i) => expansion.extend(args[i].iter().cloned()),
                    None => expansion.push(t),
                }
                next = body.next();
            }
            let mut i = 1;
            while i + 1 < expansion.len() {
                if expansion[i].is("##") {
                    let pasted = format!("{}{}", expansion[i - 1].text, expansion[i + 1].text);
                    expansion[i - 1].text = pasted.into();
                    expansion.drain(i..i + 2);
                } else {
                    i += 1;
                }
            }
        }

        let spacing = self.array[start].spacing.clone();
        let mut tail = self.array.split_off((end + 1).min(self.array.len()));
        match (expansion.first_mut(), tail.first_mut()) {
            (Some(first), _) | (None, Some(first)) => first.spacing = spacing,
            (None, None) => {}
        }
        self.array.truncate(start);
        self.array.extend(expansion);
        self.array.extend(tail);
    }
}
