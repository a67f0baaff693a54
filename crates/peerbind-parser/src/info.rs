//! Rule table entries.

use serde::{Deserialize, Serialize};

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// One entry of the rule table: the native names it matches, how they map to
/// target names, and the generation policy for them.
///
/// Optional lists distinguish "not given" (`None`) from "given but empty":
/// `annotations = []` marks a name as an attribute macro that expands to
/// nothing, and `cpp_types = []` on a macro asks for it to be kept for
/// expansion instead of translated.
///
/// Entries are shared behind `Arc` once registered and never mutated; new
/// facts are recorded by registering a new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub cpp_names: Vec<String>,
    pub target_names: Option<Vec<String>>,
    pub annotations: Option<Vec<String>>,
    pub cpp_types: Option<Vec<String>>,
    pub value_types: Option<Vec<String>>,
    pub pointer_types: Option<Vec<String>>,
    /// Force an explicit `@Cast` on the native type.
    pub cast: bool,
    /// Truth value for `#if`/`#ifdef`, or instantiate a container wrapper.
    pub define: bool,
    /// Translate a macro body into a target expression.
    pub translate: bool,
    pub skip: bool,
    /// Inline the members of this class into derived classes.
    pub flatten: bool,
    /// Treat as abstract: no allocators are generated.
    pub purify: bool,
    /// Generate overridable `@Virtual` hooks for virtual members.
    pub virtualize: bool,
    /// Omit setters for member variables.
    pub immutable: bool,
    /// Use `getX`/`setX` accessor names.
    pub beanify: bool,
    /// Emit enums as value-carrying enum classes.
    pub enumerate: bool,
    /// Emit members as instance methods, never `static`.
    pub objectify: bool,
    pub base: Option<String>,
    pub cpp_text: Option<String>,
    pub target_text: Option<String>,
}

impl Info {
    pub fn new<I, S>(cpp_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cpp_names: strings(cpp_names),
            ..Self::default()
        }
    }

    /// An entry matching no name, used for text emitted ahead of all declarations.
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn cpp_names<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.cpp_names = strings(names);
        self
    }

    pub fn target_names<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.target_names = Some(strings(names));
        self
    }

    pub fn annotations<I: IntoIterator<Item = S>, S: Into<String>>(mut self, annotations: I) -> Self {
        self.annotations = Some(strings(annotations));
        self
    }

    pub fn cpp_types<I: IntoIterator<Item = S>, S: Into<String>>(mut self, types: I) -> Self {
        self.cpp_types = Some(strings(types));
        self
    }

    pub fn value_types<I: IntoIterator<Item = S>, S: Into<String>>(mut self, types: I) -> Self {
        self.value_types = Some(strings(types));
        self
    }

    pub fn pointer_types<I: IntoIterator<Item = S>, S: Into<String>>(mut self, types: I) -> Self {
        self.pointer_types = Some(strings(types));
        self
    }

    pub fn cast(mut self, cast: bool) -> Self {
        self.cast = cast;
        self
    }

    pub fn define(mut self, define: bool) -> Self {
        self.define = define;
        self
    }

    pub fn translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn purify(mut self, purify: bool) -> Self {
        self.purify = purify;
        self
    }

    pub fn virtualize(mut self, virtualize: bool) -> Self {
        self.virtualize = virtualize;
        self
    }

    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    pub fn beanify(mut self, beanify: bool) -> Self {
        self.beanify = beanify;
        self
    }

    pub fn enumerate(mut self, enumerate: bool) -> Self {
        self.enumerate = enumerate;
        self
    }

    pub fn objectify(mut self, objectify: bool) -> Self {
        self.objectify = objectify;
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn cpp_text(mut self, text: impl Into<String>) -> Self {
        self.cpp_text = Some(text.into());
        self
    }

    pub fn target_text(mut self, text: impl Into<String>) -> Self {
        self.target_text = Some(text.into());
        self
    }

    pub fn first_cpp_name(&self) -> &str {
        self.cpp_names.first().map_or("", String::as_str)
    }

    pub fn first_target_name(&self) -> Option<&str> {
        self.target_names.as_ref()?.first().map(String::as_str)
    }

    pub fn first_cpp_type(&self) -> Option<&str> {
        self.cpp_types.as_ref()?.first().map(String::as_str)
    }

    pub fn first_value_type(&self) -> Option<&str> {
        self.value_types.as_ref()?.first().map(String::as_str)
    }

    pub fn first_pointer_type(&self) -> Option<&str> {
        self.pointer_types.as_ref()?.first().map(String::as_str)
    }

    /// Annotations joined with trailing spaces, ready to prefix a type.
    pub fn annotation_text(&self) -> String {
        self.annotations
            .iter()
            .flatten()
            .map(|a| format!("{a} "))
            .collect()
    }

    /// A rule that names a type but says nothing about how to map it.
    pub(crate) fn skips_type(&self) -> bool {
        self.skip && self.value_types.is_none() && self.pointer_types.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let info = Info::new(["uint32_t", "unsigned int"])
            .cast(true)
            .value_types(["int"])
            .pointer_types(["IntPointer", "IntBuffer", "int[]"]);
        assert_eq!(info.first_cpp_name(), "uint32_t");
        assert_eq!(info.first_value_type(), Some("int"));
        assert_eq!(info.first_pointer_type(), Some("IntPointer"));
        assert!(info.cast);
        assert!(info.annotations.is_none());
    }

    #[test]
    fn test_empty_list_is_not_none() {
        let info = Info::new(["__attribute__"]).annotations(Vec::<String>::new());
        assert_eq!(info.annotations.as_deref(), Some(&[][..]));
        assert_eq!(info.annotation_text(), "");
    }

    #[test]
    fn test_deserialize_defaults() {
        let info: Info = serde_json::from_str(r#"{"cpp_names": ["Foo"], "skip": true}"#).unwrap();
        assert_eq!(info.cpp_names, ["Foo"]);
        assert!(info.skip);
        assert!(!info.cast);
        assert!(info.skips_type());
    }
}
