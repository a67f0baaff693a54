use super::{capitalize, namespace_annotation, qualify_local, DeclaratorOptions, Parser};
use crate::ast::{Declaration, Declarator};
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;

/// `int i, int j, ...` for `count` array indices.
fn index_list(count: usize) -> String {
    (0..count)
        .map(|i| format!("int {}", char::from(b'i' + i as u8)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `@Name` addressing a member of an anonymous struct through the variable
/// that holds it, and the flattened target name.
fn member_of(outer: &Declarator, dcl: &Declarator) -> (String, String) {
    let annotation = if outer.indices() == 0 {
        format!("@Name(\"{}.{}\") ", outer.cpp_name, dcl.cpp_name)
    } else {
        format!("@Name({{\"{}\", \".{}\"}}) ", outer.cpp_name, dcl.cpp_name)
    };
    (annotation, format!("{}_{}", outer.target_name, dcl.target_name))
}

impl Parser<'_> {
    /// Recognizes a variable declaration, possibly declaring several
    /// variables, and emits accessors for each.
    pub(crate) fn variable(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let back = self.tokens.index;
        let spacing = self.get().spacing.to_string();
        let Some(dcl) = self.declarator(context, DeclaratorOptions::default().pointer_as_array())? else {
            return Ok(false);
        };
        if dcl.cpp_name.is_empty() || !self.get().is_any(&["[", "=", "(", ",", ":", ";"]) {
            return Ok(false);
        }
        let (modifiers, setter_type) = match &context.group {
            Some(group) if !dcl.ty.static_member => ("public native ", format!("{} ", context.shorten(&group.target_name))),
            _ => ("public static native ", "void ".to_string()),
        };

        let info = self.info_map.get_first(&qualify_local(context, &dcl.cpp_name));
        if info.as_ref().is_some_and(|i| i.skip) {
            self.skip_statement();
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }

        let outer = context.variable.as_ref();
        let mut first = true;
        for var_number in 0.. {
            self.tokens.index = back;
            let options = DeclaratorOptions::default().info_number(-1).var_number(var_number).pointer_as_array();
            let Some(dcl) = self.declarator(context, options)? else {
                break;
            };
            if dcl.cpp_name.is_empty() {
                break;
            }
            let mut decl = Declaration {
                variable: true,
                ..Declaration::new()
            };

            let mut name = dcl.target_name.clone();
            let mut name_annotation = String::new();
            if let Some(outer) = outer.filter(|o| !o.cpp_name.is_empty()) {
                (name_annotation, name) = member_of(outer, &dcl);
            }
            let (getter, setter) = if context.beanify {
                if name_annotation.is_empty() {
                    name_annotation = format!("@Name(\"{}\") ", dcl.cpp_name);
                }
                (format!("get{}", capitalize(&name)), format!("set{}", capitalize(&name)))
            } else {
                (name.clone(), name.clone())
            };

            let annotations = dcl.ty.annotations.replace("@ByVal ", "@ByRef ");
            if outer.map_or(true, |o| o.indices() == 0) || dcl.indices() == 0 {
                let count = match outer {
                    Some(o) if o.indices() > 0 => o.indices(),
                    _ => dcl.indices(),
                };
                let indices = index_list(count);
                decl.text.push_str(&namespace_annotation(context));
                decl.text.push_str(&name_annotation);
                if dcl.ty.const_value {
                    decl.text.push_str("@MemberGetter ");
                }
                decl.text.push_str(&format!("{modifiers}{annotations}{} {getter}({indices});", dcl.ty.target_name));
                if !dcl.ty.const_value && !context.immutable {
                    let separator = if indices.is_empty() { "" } else { ", " };
                    decl.text.push_str(&format!(
                        " {name_annotation}{modifiers}{setter_type}{setter}({indices}{separator}{} {name});",
                        dcl.ty.target_name
                    ));
                }
                decl.text.push('\n');
            }
            if dcl.indices() > 0 {
                // arrays also get a pointer to their first element
                self.tokens.index = back;
                let options = DeclaratorOptions::default().info_number(-1).var_number(var_number).array_as_pointer();
                if let Some(pointer) = self.declarator(context, options)? {
                    let indices = index_list(outer.map_or(0, Declarator::indices));
                    decl.text.push_str(&namespace_annotation(context));
                    decl.text.push_str(&name_annotation);
                    decl.text.push_str(&format!(
                        "@MemberGetter {modifiers}{}{} {getter}({indices});\n",
                        pointer.ty.annotations.replace("@ByVal ", "@ByRef "),
                        pointer.ty.target_name
                    ));
                }
            }
            decl.signature = dcl.signature.clone();
            decl.declarator = Some(dcl);
            if let Some(text) = info.as_ref().and_then(|i| i.target_text.clone()) {
                decl.text = text;
                decl.declarator = None;
                decl.custom = true;
            }

            self.skip_statement();
            let comment = self.comment_after();
            if first {
                first = false;
                list.spacing = Some(spacing.clone());
                decl.text = comment + &decl.text;
            }
            list.add(decl, self.info_map);
        }
        list.spacing = None;
        Ok(true)
    }

    /// Advances past the next `;`.
    pub(crate) fn skip_statement(&mut self) {
        let mut token = self.get();
        while !token.is_eof() && !token.is(";") {
            token = self.next();
        }
        self.next();
    }
}
