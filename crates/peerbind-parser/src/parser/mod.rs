//! Recursive-descent recognizers over a [`TokenIndexer`].
//!
//! Every recognizer has the shape `(context, output) -> Result<bool>`: it
//! either consumes a whole construct and appends declarations, or reports
//! `false` and leaves the cursor where it found it. [`Parser::attempt`]
//! enforces the second half of that contract so recognizers can bail out
//! from anywhere.

mod attribute;
mod comments;
mod containers;
mod declarator;
mod enumeration;
mod function;
mod group;
mod macros;
mod namespace;
mod params;
mod typedef;
mod types;
mod variable;

pub(crate) use declarator::DeclaratorOptions;

use crate::ast::{Declarator, Type};
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::{ParseError, Result};
use crate::indexer::TokenIndexer;
use crate::info_map::InfoMap;
use crate::token::{Keyword, Token};
use crate::tokenizer::Tokenizer;
use peerbind_common::{Diagnostic, Location};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{trace, warn};

type Recognizer<'a> = fn(&mut Parser<'a>, &Context, &mut DeclarationList) -> Result<bool>;

/// Parses one token stream into declarations, learning new rules as it goes.
///
/// The rule table is borrowed mutably for the lifetime of the parser:
/// typedefs, enums, classes and macros register what they define so that
/// later declarations, and later headers parsed with the same table,
/// resolve to the same target names.
pub struct Parser<'a> {
    pub(crate) info_map: &'a mut InfoMap,
    pub(crate) tokens: TokenIndexer,
    /// Names brought into scope by `using` declarations and directives.
    pub(crate) using_list: Vec<String>,
    /// Member text of classes flagged `flatten`, by native name.
    pub(crate) flattened: FxHashMap<String, String>,
    /// Constructor declarations of each class, for `using Base::Base`.
    pub(crate) constructors: FxHashMap<String, Vec<crate::ast::Declaration>>,
    pub(crate) warnings: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(info_map: &'a mut InfoMap, tokens: Vec<Token>) -> Self {
        Self {
            info_map,
            tokens: TokenIndexer::new(tokens),
            using_list: Vec::new(),
            flattened: FxHashMap::default(),
            constructors: FxHashMap::default(),
            warnings: Vec::new(),
        }
    }

    /// Tokenizes `text` and prepares to parse it.
    pub fn from_text(info_map: &'a mut InfoMap, text: &str) -> Self {
        Self::new(info_map, Tokenizer::new(text).tokenize())
    }

    /// Parses every declaration of the token stream into `list`.
    pub fn parse(&mut self, context: &Context, list: &mut DeclarationList) -> Result<()> {
        self.declarations(context.clone(), list)
    }

    pub fn info_map(&self) -> &InfoMap {
        self.info_map
    }

    /// Recoverable problems found so far.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    /// Parses `text` as a type in `context`, with the same rule table.
    pub fn parse_type_fragment(&mut self, text: &str, context: &Context) -> Result<Option<Type>> {
        self.fragment(text, |p| p.parse_type(context))
    }

    /// Parses `text` as a declarator in `context`, with the same rule table.
    pub fn parse_declarator_fragment(&mut self, text: &str, context: &Context) -> Result<Option<Declarator>> {
        self.fragment(text, |p| p.declarator(context, DeclaratorOptions::default()))
    }

    pub(crate) fn get(&mut self) -> Token {
        self.tokens.get(0, self.info_map)
    }

    pub(crate) fn get_at(&mut self, i: isize) -> Token {
        self.tokens.get(i, self.info_map)
    }

    pub(crate) fn next(&mut self) -> Token {
        self.tokens.next(self.info_map)
    }

    pub(crate) fn set_spacing(&mut self, spacing: &str) {
        self.tokens.set_spacing(0, spacing, self.info_map);
    }

    /// Runs `f` with preprocessing disabled and comments visible.
    pub(crate) fn raw<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.tokens.raw, true);
        let result = f(self);
        self.tokens.raw = previous;
        result
    }

    /// Runs a recognizer, restoring the cursor unless it matched.
    pub(crate) fn attempt(&mut self, f: impl FnOnce(&mut Self) -> Result<bool>) -> Result<bool> {
        let back = self.tokens.index;
        let matched = f(self)?;
        if !matched {
            self.tokens.index = back;
        }
        Ok(matched)
    }

    /// Runs `f` on a parser over `text` that shares this rule table. The
    /// fragment's tokens are attributed to the current position.
    pub(crate) fn fragment<T>(&mut self, text: &str, f: impl FnOnce(&mut Parser<'_>) -> Result<T>) -> Result<T> {
        let location = self.get().location();
        let tokens = Tokenizer::new(text).at(&location).tokenize();
        let mut sub = Parser {
            info_map: &mut *self.info_map,
            tokens: TokenIndexer::new(tokens),
            using_list: self.using_list.clone(),
            flattened: FxHashMap::default(),
            constructors: FxHashMap::default(),
            warnings: Vec::new(),
        };
        let result = f(&mut sub);
        let warnings = std::mem::take(&mut sub.warnings);
        self.warnings.extend(warnings);
        result
    }

    /// Records a warning once per location and message.
    pub(crate) fn warn(&mut self, location: Location, message: String) {
        let seen = self
            .warnings
            .iter()
            .any(|w| w.message == message && w.location.as_ref() == Some(&location));
        if seen {
            return;
        }
        warn!(%location, "{message}");
        self.warnings.push(Diagnostic::warning(message).with_location(location));
    }

    /// Rewrites `ns::name` into `Peer.name` using the peer class of `ns`.
    pub(crate) fn translate(&self, text: &str) -> String {
        let Some(i) = text.rfind("::") else {
            return text.to_string();
        };
        let scope = &text[..i];
        let name = &text[i + 2..];
        let peer = self
            .info_map
            .get_first(scope.trim())
            .and_then(|info| info.first_pointer_type().map(str::to_string));
        match peer {
            Some(peer) => {
                let leading = &scope[..scope.len() - scope.trim_start().len()];
                format!("{leading}{peer}.{name}")
            }
            None => name.to_string(),
        }
    }

    /// Parses declarations until end of input or a closing brace.
    pub(crate) fn declarations(&mut self, mut context: Context, list: &mut DeclarationList) -> Result<()> {
        let saved = list.take_statement();
        loop {
            let mut token = self.get();
            if token.is_eof() || token.is("}") {
                break;
            }
            while token.is_any_keyword(&[Keyword::Private, Keyword::Protected, Keyword::Public])
                && self.get_at(1).is(":")
            {
                context.inaccessible = !token.is_keyword(Keyword::Public);
                self.next();
                token = self.next();
            }

            let comment = self.comment_before();
            let token = self.get();
            let spacing = token.spacing.to_string();
            let mut statement = context.clone();
            let template = self.template(&context)?.map(Arc::new);
            if let Some(map) = &template {
                self.set_spacing(&spacing);
                statement.template_map = Some(Arc::clone(map));
            }
            list.begin_statement(statement.inaccessible, template.clone());
            if !comment.is_empty() {
                list.add(crate::ast::Declaration::comment(comment), self.info_map);
            }

            let start = self.tokens.index;
            let first = self.get();
            loop {
                let mut scope = statement.clone();
                if let Some(map) = &template {
                    if let Some(info) = list.next_instance() {
                        let instance = self.fragment(info.first_cpp_name(), |p| p.parse_type(&context))?;
                        let Some(arguments) = instance.and_then(|t| t.arguments) else {
                            if list.has_pending_instances() {
                                continue;
                            }
                            break;
                        };
                        let mut bound = (**map).clone();
                        bound.bind_all(&arguments);
                        if let Some(owner) = list.template_owner() {
                            bound.set_owner(owner.clone());
                        }
                        let bound = Arc::new(bound);
                        list.bind_template(Arc::clone(&bound));
                        scope.template_map = Some(bound);
                        self.tokens.index = start;
                    }
                }

                self.statement(&scope, list, &first)?;
                while self.get().is(";") {
                    self.next();
                }
                if !list.has_pending_instances() {
                    break;
                }
            }
        }

        // whitespace left at the end of the input carries no text of its own
        let comment = self.comment_before();
        if !comment.trim().is_empty() {
            list.add(crate::ast::Declaration::comment(comment), self.info_map);
        }
        list.restore_statement(saved);
        Ok(())
    }

    /// Tries every recognizer in order at the current position.
    fn statement(&mut self, context: &Context, list: &mut DeclarationList, first: &Token) -> Result<()> {
        let recognizers: [(&str, Recognizer<'a>); 9] = [
            ("macro", Self::macro_decl),
            ("extern", Self::extern_block),
            ("namespace", Self::namespace),
            ("enumeration", Self::enumeration),
            ("group", Self::group),
            ("typedef", Self::typedef),
            ("using", Self::using),
            ("function", Self::function),
            ("variable", Self::variable),
        ];
        for (name, recognize) in recognizers {
            if self.attempt(|p| recognize(p, context, list))? {
                trace!(recognizer = name, line = first.line, "matched");
                return Ok(());
            }
        }

        let spacing = self.get().spacing.to_string();
        if self.attribute()?.is_some() {
            self.set_spacing(&spacing);
            Ok(())
        } else {
            Err(ParseError::Unrecognized {
                location: first.location(),
                token: first.describe(),
            })
        }
    }
}

/// `name` with its first character upper-cased.
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The text after the last space, which drops leading annotations.
pub(crate) fn last_word(text: &str) -> &str {
    text.rsplit(' ').next().unwrap_or(text)
}

/// `@Namespace("ns") ` for declarations at namespace scope.
pub(crate) fn namespace_annotation(context: &Context) -> String {
    match (&context.namespace, &context.group) {
        (Some(ns), None) => format!("@Namespace(\"{ns}\") "),
        _ => String::new(),
    }
}

/// Prefixes `name` with the enclosing namespace unless already qualified.
pub(crate) fn qualify_local(context: &Context, name: &str) -> String {
    match &context.namespace {
        Some(ns) if !name.contains("::") => format!("{ns}::{name}"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("size"), "Size");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_last_word() {
        assert_eq!(last_word("@Cast(\"x\") IntPointer"), "IntPointer");
        assert_eq!(last_word("int"), "int");
    }

    #[test]
    fn test_translate() {
        let mut map = InfoMap::with_parent(None);
        map.put(crate::info::Info::new(["ns::Outer"]).pointer_types(["Outer"]));
        let parser = Parser::from_text(&mut map, "");
        assert_eq!(parser.translate(" ns::Outer::VALUE"), " Outer.VALUE");
        assert_eq!(parser.translate(" unknown::VALUE"), "VALUE");
        assert_eq!(parser.translate(" 42"), " 42");
    }

    #[test]
    fn test_attempt_restores_cursor() {
        let mut map = InfoMap::with_parent(None);
        let mut parser = Parser::from_text(&mut map, "int x;");
        let matched = parser
            .attempt(|p| {
                p.next();
                p.next();
                Ok(false)
            })
            .unwrap();
        assert!(!matched);
        assert_eq!(parser.tokens.index, 0);
    }

    #[test]
    fn test_unrecognized_declaration_is_fatal() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "int x;\n{");
        let mut list = DeclarationList::new();
        let err = parser.parse(&Context::new(), &mut list).unwrap_err();
        assert!(matches!(err, ParseError::Unrecognized { .. }));
        assert!(err.to_string().contains(":2: Could not parse declaration at '{'"));
    }
    #[test]
    fn test_trailing_whitespace_adds_nothing() {
        let mut map = InfoMap::new();
        let mut list = DeclarationList::new();
        Parser::from_text(&mut map, "int f();

  
").parse(&Context::new(), &mut list).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.text(), "public static native int f();");
    }

    #[test]
    fn test_trailing_comment_is_kept() {
        let mut map = InfoMap::new();
        let mut list = DeclarationList::new();
        Parser::from_text(&mut map, "int f();
// end
").parse(&Context::new(), &mut list).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.last().unwrap().text.contains("// end"));
    }
}
