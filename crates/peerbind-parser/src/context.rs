//! Scope state threaded through the recognizers.

use crate::ast::{Declarator, Type};
use crate::info_map::normalize;
use crate::template::TemplateMap;
use std::sync::Arc;

/// Where the parser currently is and which generation policies apply.
///
/// Recognizers receive a shared reference and clone it when they open a
/// nested scope, so a scope never sees changes made inside its children.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// `::`-separated path of the enclosing namespaces and classes.
    pub namespace: Option<String>,
    /// The enclosing class, struct or union.
    pub group: Option<Type>,
    /// Inside a `private:` or `protected:` section.
    pub inaccessible: bool,
    pub virtualize: bool,
    pub immutable: bool,
    pub beanify: bool,
    pub objectify: bool,
    /// The enclosing class also has a `const`-qualified variant in the rule
    /// table, so its `const` methods are marked as such.
    pub const_variant: bool,
    /// Parsing a C header: no constructors, destructors or operators.
    pub c_only: bool,
    /// Member variable whose anonymous struct type is being parsed.
    pub variable: Option<Declarator>,
    pub template_map: Option<Arc<TemplateMap>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context for parsing C headers.
    pub fn c_only() -> Self {
        Self {
            c_only: true,
            ..Self::default()
        }
    }

    /// Candidate fully qualified names for `cpp_name`, most specific first:
    /// each enclosing namespace from the innermost out, with template
    /// arguments added when the name is the template being instantiated,
    /// then every `using` declaration that could bring it into scope.
    pub fn qualify(&self, cpp_name: &str, using_list: &[String]) -> Vec<String> {
        if cpp_name.is_empty() {
            return Vec::new();
        }
        let mut names = Vec::new();
        let mut ns = Some(self.namespace.clone().unwrap_or_default());
        while let Some(current) = ns {
            let name = if current.is_empty() {
                cpp_name.to_string()
            } else {
                format!("{current}::{cpp_name}")
            };
            let mut map = self.template_map.as_deref();
            while let Some(m) = map {
                if m.name() == Some(name.as_str()) {
                    names.push(format!("{name}{}", m.arguments()));
                    break;
                }
                map = m.parent().map(Arc::as_ref);
            }
            names.push(name);

            let outer = normalize(&current, false, true);
            ns = match outer.rfind("::") {
                Some(i) => Some(outer[..i].to_string()),
                None if !outer.is_empty() => Some(String::new()),
                None => None,
            };
        }

        let prefix = normalize(cpp_name, false, true);
        for using in using_list {
            let Some(i) = using.rfind("::") else {
                continue;
            };
            let (scope, suffix) = using.split_at(i + 2);
            if suffix.is_empty() || prefix == suffix {
                names.push(format!("{scope}{cpp_name}"));
            }
        }
        names
    }

    /// Drops the part of a dotted target name shared with the enclosing class.
    pub fn shorten(&self, target_name: &str) -> String {
        let Some(group) = &self.group else {
            return target_name.to_string();
        };
        let scope = format!("{}.", group.target_name);
        let mut last_dot = 0;
        for ((i, c1), c2) in target_name.char_indices().zip(scope.chars()) {
            if c1 != c2 {
                break;
            } else if c1 == '.' {
                last_dot = i;
            }
        }
        if last_dot > 0 {
            target_name[last_dot + 1..].to_string()
        } else {
            target_name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_walks_namespaces_outward() {
        let ctx = Context {
            namespace: Some("a::b".to_string()),
            ..Context::default()
        };
        assert_eq!(ctx.qualify("T", &[]), ["a::b::T", "a::T", "T"]);
        assert!(Context::new().qualify("", &[]).is_empty());
    }

    #[test]
    fn test_qualify_with_using() {
        let ctx = Context::new();
        let using = vec!["std::".to_string(), "ns::string".to_string(), "ns::other".to_string()];
        assert_eq!(ctx.qualify("string", &using), ["string", "std::string", "ns::string"]);
    }

    #[test]
    fn test_qualify_adds_template_arguments() {
        let mut map = TemplateMap::new(None);
        map.declare("T");
        map.bind("T", Type::named("int"));
        map.set_owner(crate::template::TemplateOwner::Type("Box".to_string()));
        let ctx = Context {
            template_map: Some(Arc::new(map)),
            ..Context::default()
        };
        assert_eq!(ctx.qualify("Box", &[]), ["Box<int>", "Box"]);
    }

    #[test]
    fn test_shorten() {
        let ctx = Context {
            group: Some(Type::named("Outer")),
            ..Context::default()
        };
        assert_eq!(ctx.shorten("Outer.Inner"), "Inner");
        assert_eq!(ctx.shorten("Other.Inner"), "Other.Inner");
        assert_eq!(Context::new().shorten("Outer.Inner"), "Outer.Inner");
    }
}
