//! Template parameter bindings.

use crate::ast::Type;
use indexmap::IndexMap;
use std::sync::Arc;

/// What a template parameter list is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOwner {
    Type(String),
    Function(String),
}

/// Ordered template parameter names and the types bound to them, chained to
/// the enclosing template's map.
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    params: IndexMap<String, Option<Type>>,
    variadic: Option<String>,
    parent: Option<Arc<TemplateMap>>,
    owner: Option<TemplateOwner>,
}

impl TemplateMap {
    pub fn new(parent: Option<Arc<TemplateMap>>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    /// Adds a parameter, inheriting whatever the enclosing map binds to the same name.
    pub fn declare(&mut self, name: impl Into<String>) {
        let name = name.into();
        let inherited = self.parent.as_ref().and_then(|p| p.binding(&name)).cloned();
        self.params.insert(name, inherited);
    }

    /// Marks `name` as a parameter pack.
    pub fn declare_variadic(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.declare(name.clone());
        self.variadic = Some(name);
    }

    pub fn is_variadic(&self, name: &str) -> bool {
        self.variadic.as_deref() == Some(name)
    }

    pub fn bind(&mut self, name: &str, ty: Type) {
        if let Some(slot) = self.params.get_mut(name) {
            *slot = Some(ty);
        }
    }

    /// Binds parameters in declaration order; extra arguments are ignored.
    pub fn bind_all(&mut self, arguments: &[Type]) {
        for (slot, ty) in self.params.values_mut().zip(arguments) {
            *slot = Some(ty.clone());
        }
    }

    fn binding(&self, name: &str) -> Option<&Type> {
        match self.params.get(name) {
            Some(Some(ty)) => Some(ty),
            _ => self.parent.as_ref()?.binding(name),
        }
    }

    /// Native spelling of the type bound to `name` here or in an enclosing map.
    pub fn get(&self, name: &str) -> Option<String> {
        self.binding(name).map(Type::cpp_spelling)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Whether every parameter is bound.
    pub fn full(&self) -> bool {
        self.params.values().all(Option::is_some)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn parent(&self) -> Option<&Arc<TemplateMap>> {
        self.parent.as_ref()
    }

    pub fn owner(&self) -> Option<&TemplateOwner> {
        self.owner.as_ref()
    }

    pub fn set_owner(&mut self, owner: TemplateOwner) {
        self.owner = Some(owner);
    }

    /// Native name of the templated declaration.
    pub fn name(&self) -> Option<&str> {
        match self.owner.as_ref()? {
            TemplateOwner::Type(name) | TemplateOwner::Function(name) => Some(name),
        }
    }

    /// `<A,B>`, with a space before a closing `>` that would otherwise merge.
    pub fn arguments(&self) -> String {
        let args: Vec<String> = self
            .params
            .values()
            .map(|ty| ty.as_ref().map(Type::cpp_spelling).unwrap_or_default())
            .collect();
        let mut s = format!("<{}", args.join(","));
        s.push_str(if s.ends_with('>') { " >" } else { ">" });
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_when_all_bound() {
        let mut map = TemplateMap::new(None);
        map.declare("T");
        map.declare("U");
        assert!(!map.full());
        map.bind_all(&[Type::named("int"), Type::named("float")]);
        assert!(map.full());
        assert_eq!(map.get("T").as_deref(), Some("int"));
        assert_eq!(map.get("U").as_deref(), Some("float"));
        assert_eq!(map.arguments(), "<int,float>");
    }

    #[test]
    fn test_partial_binding() {
        let mut map = TemplateMap::new(None);
        map.declare("T");
        map.declare("U");
        map.bind_all(&[Type::named("int")]);
        assert!(!map.full());
        assert_eq!(map.get("U"), None);
    }

    #[test]
    fn test_parent_fallback_and_inheritance() {
        let mut outer = TemplateMap::new(None);
        outer.declare("T");
        outer.bind("T", Type::named("double"));
        let outer = Arc::new(outer);

        let mut inner = TemplateMap::new(Some(Arc::clone(&outer)));
        inner.declare("U");
        assert_eq!(inner.get("T").as_deref(), Some("double"));
        inner.declare("T");
        assert!(!inner.full());
        inner.bind("U", Type::named("char"));
        assert!(inner.full());
    }

    #[test]
    fn test_nested_argument_spacing() {
        let mut map = TemplateMap::new(None);
        map.declare("T");
        map.bind("T", Type::named("std::vector<int>"));
        assert_eq!(map.arguments(), "<std::vector<int> >");
        map.declare_variadic("Ts");
        assert!(map.is_variadic("Ts"));
    }
}
