//! Ordered, de-duplicated output of the parser.

use crate::ast::Declaration;
use crate::info::Info;
use crate::info_map::InfoMap;
use crate::template::{TemplateMap, TemplateOwner};
use std::collections::VecDeque;
use std::sync::Arc;

/// State of the statement currently being recognized.
#[derive(Debug, Clone, Default)]
pub(crate) struct Statement {
    inaccessible: Option<bool>,
    template_map: Option<Arc<TemplateMap>>,
    owner: Option<TemplateOwner>,
    /// Rules naming instances of the template still to be generated.
    instances: Option<VecDeque<Arc<Info>>>,
}

/// Declarations in output order.
///
/// Adding a declaration also adds the helper types it depends on ahead of
/// it, drops declarations whose types are skipped, and keeps only one
/// declaration per non-empty signature.
#[derive(Debug, Clone, Default)]
pub struct DeclarationList {
    declarations: Vec<Declaration>,
    /// Spacing to apply to the next declaration's lines; see [`rescan`](Self::rescan).
    pub(crate) spacing: Option<String>,
    statement: Statement,
}

impl DeclarationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new statement in a scope with the given accessibility,
    /// optionally under a template parameter list.
    pub(crate) fn begin_statement(&mut self, inaccessible: bool, template_map: Option<Arc<TemplateMap>>) {
        self.statement = Statement {
            inaccessible: Some(inaccessible),
            template_map,
            owner: None,
            instances: None,
        };
        self.spacing = None;
    }

    pub(crate) fn take_statement(&mut self) -> Statement {
        std::mem::take(&mut self.statement)
    }

    pub(crate) fn restore_statement(&mut self, statement: Statement) {
        self.statement = statement;
    }

    /// Next rule asking for an instance of the pending template.
    pub(crate) fn next_instance(&mut self) -> Option<Arc<Info>> {
        self.statement.instances.as_mut()?.pop_front()
    }

    pub(crate) fn has_pending_instances(&self) -> bool {
        self.statement.instances.as_ref().is_some_and(|i| !i.is_empty())
    }

    /// Replaces the statement's template map with an instantiated one,
    /// keeping the instances still pending.
    pub(crate) fn bind_template(&mut self, template_map: Arc<TemplateMap>) {
        self.statement.template_map = Some(template_map);
    }

    pub(crate) fn template_owner(&self) -> Option<&TemplateOwner> {
        self.statement.owner.as_ref()
    }

    /// Re-indents `lines` with the pending spacing: the first line gets the
    /// spacing as is, later lines get its last line break and indentation.
    pub fn rescan(&mut self, lines: &str) -> String {
        let Some(mut spacing) = self.spacing.clone() else {
            return lines.to_string();
        };
        let mut text = String::with_capacity(lines.len() + spacing.len());
        for line in lines.lines() {
            text.push_str(&spacing);
            text.push_str(line);
            spacing = match spacing.rfind('\n') {
                Some(i) => spacing[i..].to_string(),
                None => "\n".to_string(),
            };
        }
        self.spacing = Some(spacing);
        text
    }

    /// Adds `decl` along with its nested definitions. Returns false when the
    /// declaration was held back: it belongs to an unbound template, or one
    /// of its types is skipped.
    pub fn add(&mut self, decl: Declaration, info_map: &InfoMap) -> bool {
        let unbound = self.statement.template_map.as_ref().is_some_and(|m| !m.full());
        if unbound && (decl.ty.is_some() || decl.declarator.is_some()) {
            if self.statement.instances.is_none() {
                let owner = match (&decl.ty, &decl.declarator) {
                    (Some(ty), _) => TemplateOwner::Type(ty.cpp_name.clone()),
                    (None, Some(dcl)) => TemplateOwner::Function(dcl.cpp_name.clone()),
                    (None, None) => return false,
                };
                let name = match &decl.declarator {
                    Some(dcl) => dcl.cpp_name.clone(),
                    None => decl.ty.as_ref().map(|t| t.cpp_name.clone()).unwrap_or_default(),
                };
                let instances: VecDeque<_> = info_map.get(&name).into_iter().collect();
                self.statement.owner = Some(owner);
                self.statement.instances = (!instances.is_empty()).then_some(instances);
            }
            return false;
        }
        if Self::skipped(&decl, info_map) {
            return false;
        }

        let mut pending = Vec::new();
        Self::unfold(decl, &mut pending);
        for mut decl in pending {
            if let Some(inaccessible) = self.statement.inaccessible {
                if !decl.text.contains("@Virtual ") {
                    decl.inaccessible = inaccessible;
                }
            }
            if decl.text.is_empty() {
                decl.inaccessible = true;
            }
            let mut found = false;
            if !decl.signature.is_empty() {
                self.declarations.retain(|d| {
                    if d.signature != decl.signature {
                        return true;
                    }
                    let worse = (d.const_member && !decl.const_member)
                        || (d.inaccessible && !decl.inaccessible)
                        || (d.incomplete && !decl.incomplete);
                    found |= !worse;
                    !worse
                });
            }
            if !found {
                decl.text = self.rescan(&decl.text);
                self.declarations.push(decl);
            }
        }
        true
    }

    fn skipped(decl: &Declaration, info_map: &InfoMap) -> bool {
        let Some(dcl) = &decl.declarator else {
            return false;
        };
        let skips = |name: &str| !name.is_empty() && info_map.get_first(name).is_some_and(|i| i.skips_type());
        if skips(&dcl.ty.cpp_name) {
            return true;
        }
        dcl.parameters
            .iter()
            .flat_map(|p| &p.declarators)
            .any(|d| skips(&d.ty.cpp_name))
    }

    /// Helper definitions first, then the declaration that needs them.
    fn unfold(decl: Declaration, out: &mut Vec<Declaration>) {
        if let Some(dcl) = &decl.declarator {
            if let Some(definition) = &dcl.definition {
                Self::unfold((**definition).clone(), out);
            }
            for param in dcl.parameters.iter().flat_map(|p| &p.declarators) {
                if let Some(definition) = &param.definition {
                    Self::unfold((**definition).clone(), out);
                }
            }
        }
        out.push(decl);
    }

    /// Removes and returns the most recent declaration.
    pub fn remove_last(&mut self) -> Option<Declaration> {
        self.declarations.pop()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn last(&self) -> Option<&Declaration> {
        self.declarations.last()
    }

    /// Concatenated text of every declaration.
    pub fn text(&self) -> String {
        self.declarations.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<Declaration> {
        self.declarations
    }
}

impl<'a> IntoIterator for &'a DeclarationList {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.iter()
    }
}

impl IntoIterator for DeclarationList {
    type Item = Declaration;
    type IntoIter = std::vec::IntoIter<Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declarator, Parameters, Type};

    fn function(signature: &str, text: &str) -> Declaration {
        Declaration {
            signature: signature.to_string(),
            function: true,
            ..Declaration::with_text(text)
        }
    }

    #[test]
    fn test_signature_dedupe_first_wins() {
        let map = InfoMap::with_parent(None);
        let mut list = DeclarationList::new();
        assert!(list.add(function("f_int", "a\n"), &map));
        assert!(list.add(function("f_int", "b\n"), &map));
        assert_eq!(list.len(), 1);
        assert_eq!(list.text(), "a\n");
    }

    #[test]
    fn test_prefers_non_const_member() {
        let map = InfoMap::with_parent(None);
        let mut list = DeclarationList::new();
        let mut first = function("get", "const\n");
        first.const_member = true;
        list.add(first, &map);
        list.add(function("get", "mutable\n"), &map);
        assert_eq!(list.len(), 1);
        assert_eq!(list.text(), "mutable\n");
    }

    #[test]
    fn test_empty_text_is_inaccessible() {
        let map = InfoMap::with_parent(None);
        let mut list = DeclarationList::new();
        list.add(Declaration::new(), &map);
        assert!(list.last().unwrap().inaccessible);
    }

    #[test]
    fn test_skipped_parameter_type() {
        let mut map = InfoMap::with_parent(None);
        map.put(Info::new(["Hidden"]).skip(true));
        let param = Declarator {
            ty: Type::named("Hidden"),
            ..Declarator::default()
        };
        let decl = Declaration {
            declarator: Some(Declarator {
                ty: Type::named("void"),
                parameters: Some(Parameters {
                    declarators: vec![param],
                    ..Parameters::default()
                }),
                ..Declarator::default()
            }),
            ..function("f_Hidden", "f\n")
        };
        let mut list = DeclarationList::new();
        assert!(!list.add(decl, &map));
        assert!(list.is_empty());
    }

    #[test]
    fn test_definitions_come_first() {
        let map = InfoMap::with_parent(None);
        let decl = Declaration {
            declarator: Some(Declarator {
                definition: Some(Box::new(Declaration::with_text("class Callback\n"))),
                ..Declarator::default()
            }),
            ..function("f", "f\n")
        };
        let mut list = DeclarationList::new();
        list.add(decl, &map);
        assert_eq!(list.text(), "class Callback\nf\n");
    }

    #[test]
    fn test_rescan_reindents() {
        let mut list = DeclarationList::new();
        assert_eq!(list.rescan("a\nb\n"), "a\nb\n");
        list.spacing = Some("\n\n    ".to_string());
        assert_eq!(list.rescan("a\nb\n"), "\n\n    a\n    b");
    }

    #[test]
    fn test_unbound_template_deferred() {
        let mut map = InfoMap::with_parent(None);
        map.put(Info::new(["Box<int>"]).pointer_types(["IntBox"]));
        let mut template = TemplateMap::new(None);
        template.declare("T");
        let mut list = DeclarationList::new();
        list.begin_statement(false, Some(Arc::new(template)));
        let decl = Declaration {
            ty: Some(Type::named("Box")),
            ..Declaration::with_text("class Box")
        };
        assert!(!list.add(decl, &map));
        assert!(list.is_empty());
        assert!(list.has_pending_instances());
        assert_eq!(list.template_owner(), Some(&TemplateOwner::Type("Box".to_string())));
        assert_eq!(list.next_instance().unwrap().first_cpp_name(), "Box<int>");
        assert!(!list.has_pending_instances());
    }
}
