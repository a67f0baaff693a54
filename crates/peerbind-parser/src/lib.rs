//! Forgiving C/C++ header parser for the peerbind binding generator.
//!
//! This crate provides:
//! - A tokenizer that keeps inter-token whitespace and comments
//! - A rule table ([`InfoMap`]) mapping native names to target types and policies
//! - Backtracking recognizers for macros, namespaces, enums, classes,
//!   typedefs, functions and variables
//! - An ordered, de-duplicated [`DeclarationList`] of peer-class text
//!
//! # Architecture
//!
//! ```text
//! Header text → Tokenizer → TokenIndexer (#if, macro expansion) → Parser → DeclarationList
//!                                  ↑                                 ↓
//!                                  └────────── InfoMap (rules) ←─────┘
//! ```
//!
//! The rule table is both input and output: declarations that introduce
//! types (typedefs, enums, classes, constant macros) register them so later
//! headers resolve to the same names.

mod ast;
mod context;
mod declaration_list;
pub mod defaults;
mod error;
mod indexer;
mod info;
mod info_map;
mod parser;
mod template;
mod token;
mod tokenizer;

pub use ast::{Attribute, Declaration, Declarator, Parameters, Type};
pub use context::Context;
pub use declaration_list::DeclarationList;
pub use error::{ParseError, Result};
pub use indexer::TokenIndexer;
pub use info::Info;
pub use info_map::{normalize, InfoMap, Priority};
pub use parser::Parser;
pub use template::{TemplateMap, TemplateOwner};
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::{LineFilter, Tokenizer};

/// Parses header `text` in `context`, learning new rules into `info_map`.
pub fn parse_text(info_map: &mut InfoMap, text: &str, context: &Context) -> Result<DeclarationList> {
    let mut list = DeclarationList::new();
    Parser::from_text(info_map, text).parse(context, &mut list)?;
    Ok(list)
}
