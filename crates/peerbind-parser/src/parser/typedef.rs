//! `typedef` and `using`.

use super::group::opaque_class;
use super::{last_word, namespace_annotation, DeclaratorOptions, Parser};
use crate::ast::{Declaration, Declarator};
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;
use crate::info::Info;
use crate::token::Keyword;
use tracing::debug;

impl Parser<'_> {
    /// Recognizes a `typedef` and registers each name it defines. Function
    /// pointer types and opaque `void` types also produce a peer class.
    pub(crate) fn typedef(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let spacing = self.get().spacing.to_string();
        if !self.get().is_keyword(Keyword::Typedef) {
            return Ok(false);
        }
        let back = self.tokens.index;
        let mut decls = Vec::new();
        for var_number in 0.. {
            self.tokens.index = back;
            let options = DeclaratorOptions::default().var_number(var_number).array_as_pointer();
            let Some(dcl) = self.declarator(context, options)? else {
                break;
            };
            if dcl.cpp_name.is_empty() {
                break;
            }
            decls.push(self.alias(context, dcl));
            if !self.get().is(",") {
                break;
            }
        }
        if decls.is_empty() {
            return Ok(false);
        }
        self.skip_statement();

        let comment = self.comment_after();
        list.spacing = Some(spacing);
        for (i, mut decl) in decls.into_iter().enumerate() {
            if i == 0 {
                decl.text = comment.clone() + &decl.text;
            }
            list.add(decl, self.info_map);
        }
        list.spacing = None;
        Ok(true)
    }

    /// Registers `dcl.cpp_name` as another name for the declarator's type.
    fn alias(&mut self, context: &Context, dcl: Declarator) -> Declaration {
        let type_name = dcl.ty.cpp_name.clone();
        let def_name = match &context.namespace {
            Some(ns) => format!("{ns}::{}", dcl.cpp_name),
            None => dcl.cpp_name.clone(),
        };

        if let Some(definition) = dcl.definition {
            // function pointer
            let target = match &context.group {
                Some(group) if !dcl.target_name.is_empty() => format!("{}.{}", group.target_name, dcl.target_name),
                _ => dcl.target_name.clone(),
            };
            let by_ptr = if dcl.indirections > 0 { "@ByPtrPtr " } else { "" };
            debug!(name = %def_name, %target, "registered function pointer type");
            self.info_map
                .put(Info::new([def_name.as_str()]).value_types([target.as_str()]).pointer_types([format!("{by_ptr}{target}")]));
            return *definition;
        }

        let mut decl = Declaration::new();
        if type_name == "void" {
            let info = self.info_map.get_first(&def_name);
            if info.as_ref().is_some_and(|i| i.skip) {
                return decl;
            }
            if dcl.indirections > 0 {
                decl.text.push_str("@Namespace @Name(\"void\") ");
                let info = match info {
                    Some(info) => (*info).clone(),
                    None => Info::new([def_name.as_str()]),
                };
                self.info_map.put(
                    info.value_types([dcl.target_name.as_str()])
                        .pointer_types([format!("@ByPtrPtr {}", dcl.target_name)]),
                );
            } else {
                decl.text.push_str(&namespace_annotation(context));
            }
            decl.text.push_str(&opaque_class(&dcl.target_name, "Pointer"));
            return decl;
        }

        let info = self.info_map.get_first(&type_name);
        if info.as_ref().is_some_and(|i| i.skip) {
            return decl;
        }
        let target = last_word(&dcl.ty.target_name).to_string();
        let mut info = match info {
            Some(info) => (*info).clone().cpp_names([def_name.as_str()]),
            None => Info::new([def_name.as_str()]),
        };
        if info.cpp_types.is_none() {
            info.cpp_types = Some(vec![type_name.clone()]);
        }
        if info.value_types.is_none() && dcl.indirections > 0 {
            info.value_types = Some(vec![target]);
            info.pointer_types = Some(vec!["PointerPointer".to_string()]);
        } else if info.pointer_types.is_none() {
            info.pointer_types = Some(vec![target]);
        }
        if info.annotations.is_none() {
            let local = def_name.rsplit("::").next().unwrap_or(&def_name);
            info.cast = info.pointer_types.as_ref().and_then(|p| p.first()).is_some_and(|p| p != local);
        }
        debug!(name = %def_name, %type_name, "registered typedef");
        self.info_map.put(info);
        decl
    }

    /// Recognizes `using namespace ns;`, `using ns::name;`, alias
    /// declarations, and inherited constructors.
    pub(crate) fn using(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        if !self.get().is_keyword(Keyword::Using) {
            return Ok(false);
        }
        let spacing = self.get().spacing.to_string();
        let namespace = self.next().is_keyword(Keyword::Namespace);
        if namespace {
            self.next();
        }
        let mut name = String::new();
        let mut token = self.get();
        while token.is_word() || token.is("::") {
            if !token.is_keyword(Keyword::Typename) {
                name.push_str(&token.text);
            }
            token = self.next();
        }

        let mut decls = Vec::new();
        if namespace {
            self.using_list.push(format!("{name}::"));
            self.skip_statement();
        } else if token.is("=") {
            let mut target = String::new();
            let mut token = self.next();
            while !token.is_eof() && !token.is(";") {
                target.push_str(&token.spacing);
                target.push_str(&token.text);
                token = self.next();
            }
            self.next();
            let source = format!("typedef {target} {name};");
            let mut aliased = DeclarationList::new();
            self.fragment(&source, |p| p.typedef(context, &mut aliased))?;
            decls.extend(aliased.into_vec());
        } else {
            self.skip_statement();
            match self.inherited_constructors(context, &name) {
                Some(constructors) => decls = constructors,
                None => self.using_list.push(name),
            }
        }

        let comment = self.comment_after();
        if decls.is_empty() {
            decls.push(Declaration::new());
        }
        list.spacing = Some(spacing);
        for (i, mut decl) in decls.into_iter().enumerate() {
            if i == 0 {
                decl.text = comment.clone() + decl.text.trim_start();
            }
            list.add(decl, self.info_map);
        }
        list.spacing = None;
        Ok(true)
    }

    /// For `using Base::Base;` in a class, the constructors of `Base`
    /// restated for the enclosing class.
    fn inherited_constructors(&self, context: &Context, name: &str) -> Option<Vec<Declaration>> {
        let group = context.group.as_ref()?;
        let (base, last) = name.rsplit_once("::")?;
        if last_word(base.rsplit("::").next()?) != last {
            return None;
        }
        let constructors = context
            .qualify(base, &self.using_list)
            .into_iter()
            .find_map(|n| self.constructors.get(&n))?;
        let derived = &group.target_name;
        let replayed = constructors
            .iter()
            .filter_map(|c| {
                let params = c.declarator.as_ref()?.parameters.as_ref()?;
                let mut decl = c.clone();
                decl.text = format!(
                    "public {derived}{} {{ super((Pointer)null); allocate{}; }}\nprivate native void allocate{};\n",
                    params.list, params.names, params.list
                );
                decl.signature = format!("{derived}{}", params.signature);
                Some(decl)
            })
            .collect();
        Some(replayed)
    }
}
