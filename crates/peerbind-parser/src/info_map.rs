//! The layered rule table.

use crate::defaults;
use crate::info::Info;
use crate::token::{Keyword, Token};
use crate::tokenizer::Tokenizer;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Fundamental type words, sorted. Names made only of these are put in
/// canonical order so that `long unsigned int` and `unsigned long int`
/// resolve to the same entry.
pub const SIMPLE_TYPES: [&str; 9] = [
    "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned",
];

/// Where to insert a new entry among those already registered for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Ahead of every existing entry, so it wins lookups.
    First,
    Last,
    At(usize),
}

/// Normalized native name to an ordered list of rules, most specific first,
/// layered over an optional parent table.
///
/// Lookups return local hits followed by parent hits. A table built with
/// [`InfoMap::new`] sits on top of the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct InfoMap {
    entries: FxHashMap<String, Vec<Arc<Info>>>,
    parent: Option<Arc<InfoMap>>,
}

/// Canonical form of a native name used as a table key.
///
/// Leading `const` qualifiers are hoisted out. Names made only of
/// fundamental type words are sorted. With `untemplate`, a single top-level
/// template argument list running to the end of the name is removed. With
/// `unconst`, the hoisted `const` is dropped.
pub fn normalize(name: &str, unconst: bool, untemplate: bool) -> String {
    if name.is_empty() {
        return String::new();
    }
    let tokens: Vec<Token> = Tokenizer::new(name).filter(|t| !t.is_comment()).collect();
    let mut found_const = false;
    let mut simple = true;
    let mut kept: Vec<&Token> = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if token.is_keyword(Keyword::Const) {
            found_const = true;
        } else if SIMPLE_TYPES.binary_search(&token.text.as_str()).is_ok() {
            kept.push(token);
        } else {
            simple = false;
            kept.extend(&tokens[i..]);
            break;
        }
    }

    let mut result = if simple && !kept.is_empty() {
        let mut words: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        words.sort_unstable();
        let words = words.join(" ");
        if found_const {
            format!("const {words}")
        } else {
            words
        }
    } else if !simple && untemplate {
        let mut depth = 0i32;
        let mut template = None;
        for (i, token) in kept.iter().enumerate() {
            if token.is("<") {
                if depth == 0 {
                    template = Some(i);
                }
                depth += 1;
            } else if token.is(">") {
                depth -= 1;
                if depth == 0 && i + 1 != kept.len() {
                    template = None;
                }
            }
        }
        match template {
            Some(end) if depth == 0 => {
                let mut stripped = String::from(if found_const { "const " } else { "" });
                for (i, token) in kept[..end].iter().enumerate() {
                    if i > 0 {
                        stripped.push_str(&token.spacing);
                    }
                    stripped.push_str(&token.text);
                }
                stripped
            }
            _ => name.to_string(),
        }
    } else {
        name.to_string()
    };

    if unconst && found_const {
        if let Some(i) = result.find("const") {
            result = result[i + 5..].to_string();
        }
    }
    result.trim().to_string()
}

impl InfoMap {
    /// An empty table layered over the built-in defaults.
    pub fn new() -> Self {
        Self::with_parent(Some(defaults::defaults()))
    }

    pub fn with_parent(parent: Option<Arc<InfoMap>>) -> Self {
        Self {
            entries: FxHashMap::default(),
            parent,
        }
    }

    pub fn parent(&self) -> Option<&Arc<InfoMap>> {
        self.parent.as_ref()
    }

    /// All rules for `name`, local ones first, then those of the parent.
    /// Allows matching a template instance against a rule for its template.
    pub fn get(&self, name: &str) -> Vec<Arc<Info>> {
        self.get_with(name, true)
    }

    /// Like [`get`](Self::get), optionally refusing template-stripped matches.
    pub fn get_with(&self, name: &str, partial: bool) -> Vec<Arc<Info>> {
        let mut found = self.get_local_with(name, partial);
        if let Some(parent) = &self.parent {
            found.extend(parent.get_with(name, partial));
        }
        found
    }

    /// Rules registered in this table only, ignoring the parent.
    pub fn get_local(&self, name: &str) -> Vec<Arc<Info>> {
        self.get_local_with(name, true)
    }

    fn get_local_with(&self, name: &str, partial: bool) -> Vec<Arc<Info>> {
        let mut keys = vec![normalize(name, false, false), normalize(name, true, false)];
        if partial {
            keys.push(normalize(name, true, true));
        }
        keys.iter()
            .find_map(|key| self.entries.get(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_first(&self, name: &str) -> Option<Arc<Info>> {
        self.get_first_with(name, true)
    }

    pub fn get_first_with(&self, name: &str, partial: bool) -> Option<Arc<Info>> {
        if let Some(info) = self.get_local_with(name, partial).into_iter().next() {
            return Some(info);
        }
        self.parent.as_ref()?.get_first_with(name, partial)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
            || self.parent.as_ref().is_some_and(|p| p.contains_key(name))
    }

    /// Local entries registered without any native name, in order.
    pub fn unnamed(&self) -> Vec<Arc<Info>> {
        self.entries
            .get("")
            .into_iter()
            .flatten()
            .filter(|info| info.cpp_names.is_empty())
            .cloned()
            .collect()
    }

    /// Registers `info` under each of its names, in raw, const-stripped and
    /// template-stripped form. Registering the same entry twice for a key is
    /// a no-op.
    pub fn put_at(&mut self, priority: Priority, info: impl Into<Arc<Info>>) -> &mut Self {
        let info = info.into();
        let names: Vec<&str> = if info.cpp_names.is_empty() {
            vec![""]
        } else {
            info.cpp_names.iter().map(String::as_str).collect()
        };
        for name in names {
            let mut keys = vec![
                normalize(name, false, false),
                normalize(name, true, false),
                normalize(name, false, true),
            ];
            keys.dedup();
            for key in keys {
                let list = self.entries.entry(key).or_default();
                if list.iter().any(|existing| Arc::ptr_eq(existing, &info)) {
                    continue;
                }
                match priority {
                    Priority::First => list.insert(0, Arc::clone(&info)),
                    Priority::Last => list.push(Arc::clone(&info)),
                    Priority::At(i) => list.insert(i.min(list.len()), Arc::clone(&info)),
                }
            }
        }
        self
    }

    pub fn put(&mut self, info: impl Into<Arc<Info>>) -> &mut Self {
        self.put_at(Priority::Last, info)
    }

    pub fn put_first(&mut self, info: impl Into<Arc<Info>>) -> &mut Self {
        self.put_at(Priority::First, info)
    }

    /// Copies every key of `other`, replacing whole lists already present.
    pub fn put_all(&mut self, other: &InfoMap) -> &mut Self {
        for (key, list) in &other.entries {
            self.entries.insert(key.clone(), list.clone());
        }
        self
    }

    /// Appends the entries of `other` behind those already present.
    pub fn extend(&mut self, other: &InfoMap) -> &mut Self {
        for (key, list) in &other.entries {
            let local = self.entries.entry(key.clone()).or_default();
            for info in list {
                if !local.iter().any(|existing| Arc::ptr_eq(existing, info)) {
                    local.push(Arc::clone(info));
                }
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
