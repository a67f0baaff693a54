//! Classes, structs and unions.

use super::{namespace_annotation, Parser};
use crate::ast::{Declaration, Declarator, Type};
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;
use crate::info::Info;
use crate::token::Keyword;
use tracing::debug;

/// Peer class for a type whose layout is unknown.
pub(crate) fn opaque_class(name: &str, base: &str) -> String {
    format!(
        "@Opaque public static class {name} extends {base} {{\n    public {name}() {{ super((Pointer)null); }}\n    public {name}(Pointer p) {{ super(p); }}\n}}"
    )
}

/// What the members of a class say about how it can be constructed.
#[derive(Debug, Default)]
struct Members {
    implicit_constructor: bool,
    default_constructor: bool,
    size_constructor: bool,
    abstract_class: bool,
    variables: bool,
}

impl Members {
    fn scan(declarations: &DeclarationList) -> Self {
        let mut members = Members {
            implicit_constructor: true,
            ..Members::default()
        };
        for d in declarations {
            match d.declarator.as_ref().filter(|_| d.is_constructor()) {
                Some(dcl) => {
                    members.implicit_constructor = false;
                    let params = dcl.parameters.as_ref().map_or(&[][..], |p| &p.declarators[..]);
                    members.default_constructor |= params.is_empty() && !d.inaccessible;
                    members.size_constructor |= params.len() == 1 && params[0].ty.target_name == "long" && !d.inaccessible;
                }
                None if d.abstract_member => {
                    members.implicit_constructor = false;
                    members.abstract_class = true;
                }
                None => {}
            }
            members.variables |= d.variable;
        }
        members
    }
}

impl Parser<'_> {
    /// Recognizes a class, struct or union definition or forward declaration
    /// and emits its peer class with the members inside.
    pub(crate) fn group(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let spacing = self.get().spacing.to_string();
        let typedef = self.get().is_keyword(Keyword::Typedef);
        let mut found = false;
        let mut friend = false;
        let mut private_by_default = false;
        let mut token = self.get();
        while !token.is_eof() {
            if token.is_any_keyword(&[Keyword::Class, Keyword::Struct, Keyword::Union]) {
                found = true;
                private_by_default = token.is_keyword(Keyword::Class);
                break;
            } else if token.is_keyword(Keyword::Friend) {
                friend = true;
            } else if !token.is_word() {
                break;
            }
            token = self.next();
        }
        if !found {
            return Ok(false);
        }

        let token = self.next();
        if !token.is_word() && !token.is("{") {
            return Ok(false);
        }
        // an export macro between the keyword and the name
        if !token.is("{") && self.get_at(1).is_ident() && (typedef || !self.get_at(2).is(";")) {
            self.next();
        }
        let mut ty = if self.get().is("{") {
            Type::default()
        } else {
            match self.parse_type(context)? {
                Some(ty) => ty,
                None => return Ok(false),
            }
        };
        let mut decl = Declaration::with_text(ty.annotations.clone());
        let anonymous = !typedef && ty.cpp_name.is_empty();

        let mut bases = Vec::new();
        let derived = !ty.cpp_name.is_empty() && self.get().is(":");
        if derived {
            let mut token = self.next();
            while !token.is_eof() {
                let mut accessible = !private_by_default;
                if token.is_keyword(Keyword::Virtual) {
                    token = self.next();
                    continue;
                } else if token.is_any_keyword(&[Keyword::Private, Keyword::Protected, Keyword::Public]) {
                    accessible = token.is_keyword(Keyword::Public);
                    self.next();
                }
                let Some(base) = self.parse_type(context)? else {
                    return Ok(false);
                };
                if accessible {
                    bases.push(base);
                }
                if !self.get().is(",") {
                    break;
                }
                token = self.next();
            }
        }
        if !self.get().is_any(&["{", ";"]) {
            return Ok(false);
        }

        let start = self.tokens.index;
        let mut variables = Vec::new();
        if self.body() && !self.get().is(";") {
            if typedef {
                let mut token = self.get();
                while !token.is_eof() && !token.is(";") {
                    if token.is_ident() && ty.cpp_name.is_empty() {
                        ty.cpp_name = token.text.to_string();
                        ty.target_name = token.text.to_string();
                    }
                    token = self.next();
                }
            } else if anonymous {
                variables = self.trailing_variables();
            }
        }
        let mut name = ty.target_name.clone();
        if !ty.cpp_name.is_empty() {
            ty.cpp_name = super::qualify_local(context, &ty.cpp_name);
        }

        let mut info = self.info_map.get_first(&ty.cpp_name).filter(|_| !ty.cpp_name.is_empty());
        if info.as_ref().is_some_and(|i| i.skip) {
            self.finish_group(start);
            list.add(Declaration::new(), self.info_map);
            return Ok(true);
        } else if let Some(pointer) = info.as_ref().and_then(|i| i.first_pointer_type()) {
            name = pointer.to_string();
            ty.target_name = name.clone();
        } else if info.is_none() && !ty.cpp_name.is_empty() {
            if let Some(group) = &context.group {
                ty.target_name = format!("{}.{}", group.target_name, ty.target_name);
            }
            debug!(name = %ty.cpp_name, target = %ty.target_name, "registered class");
            let registered = std::sync::Arc::new(Info::new([ty.cpp_name.as_str()]).pointer_types([ty.target_name.as_str()]));
            self.info_map.put(std::sync::Arc::clone(&registered));
            info = Some(registered);
        }

        let mut base = if bases.is_empty() {
            Type::named("Pointer")
        } else {
            bases.remove(0)
        };
        if let Some(explicit) = info.as_ref().and_then(|i| i.base.clone()) {
            base.target_name = explicit;
        }
        let casts: String = bases
            .iter()
            .map(|t| {
                format!(
                    "    public {0} as{0}() {{ return as{0}(this); }}\n    @Namespace public static native @Name(\"static_cast<{1}*>\") {0} as{0}({2} pointer);\n",
                    t.target_name, t.cpp_name, ty.target_name
                )
            })
            .collect();
        decl.signature = ty.target_name.clone();

        self.tokens.index = start;
        if !name.is_empty() && self.get().is(";") {
            // forward or friend declaration
            self.next();
            if friend {
                list.add(Declaration::new(), self.info_map);
                return Ok(true);
            }
            decl.text.push_str(&self.scope_annotation(context, &name, &ty.cpp_name));
            decl.text.push_str(&opaque_class(&name, &base.target_name));
            decl.ty = Some(ty);
            decl.incomplete = true;
            let comment = self.comment_after();
            decl.text = comment + &decl.text;
            list.spacing = Some(spacing);
            list.add(decl, self.info_map);
            list.spacing = None;
            return Ok(true);
        }
        self.next();

        let mut scope = context.clone();
        scope.inaccessible = private_by_default;
        if !anonymous {
            scope.namespace = Some(ty.cpp_name.clone());
            scope.group = Some(ty.clone());
            scope.variable = None;
            let const_name = format!("const {}", ty.cpp_name);
            scope.const_variant = self
                .info_map
                .get(&const_name)
                .iter()
                .any(|i| i.cpp_names.iter().any(|n| n.trim_start().starts_with("const ")));
        }
        if let Some(info) = &info {
            scope.virtualize |= info.virtualize;
            scope.immutable |= info.immutable;
            scope.beanify |= info.beanify;
            scope.objectify |= info.objectify;
        }

        let body = self.tokens.index;
        let mut members = DeclarationList::new();
        if variables.is_empty() {
            self.declarations(scope.clone(), &mut members)?;
        } else {
            for mut variable in variables {
                if let Some(outer) = &context.variable {
                    variable.cpp_name = format!("{}.{}", outer.cpp_name, variable.cpp_name);
                    variable.target_name = format!("{}_{}", outer.target_name, variable.target_name);
                }
                scope.variable = Some(variable);
                self.tokens.index = body;
                self.declarations(scope.clone(), &mut members)?;
            }
        }

        let mut analysis = Members::scan(&members);
        let purify = info.as_ref().is_some_and(|i| i.purify);
        if purify {
            analysis.implicit_constructor = false;
            analysis.abstract_class = true;
        }
        if context.c_only {
            analysis.implicit_constructor = false;
        }

        let mut member_text = String::new();
        for d in &members {
            if !d.inaccessible && !(d.is_constructor() && analysis.abstract_class) {
                member_text.push_str(&d.text);
            }
        }
        for base in std::iter::once(&base).chain(&bases) {
            let flattened = context
                .qualify(&base.cpp_name, &self.using_list)
                .into_iter()
                .find_map(|n| self.flattened.get(&n).cloned());
            if let Some(text) = flattened {
                member_text.push_str(&text);
            }
        }
        if info.as_ref().is_some_and(|i| i.flatten) {
            self.flattened.insert(ty.cpp_name.clone(), member_text.clone());
        }
        let constructors: Vec<Declaration> = members.iter().filter(|d| d.is_constructor()).cloned().collect();
        if !constructors.is_empty() {
            self.constructors.insert(ty.cpp_name.clone(), constructors);
        }

        if !anonymous {
            let modifiers = if scope.virtualize && analysis.abstract_class {
                "public static abstract "
            } else {
                "public static "
            };
            let mut header = self.scope_annotation(context, &name, &ty.cpp_name);
            if (!analysis.implicit_constructor || derived) && analysis.variables {
                header.push_str("@NoOffset ");
            }
            header.push_str(&format!(
                "{modifiers}class {name} extends {} {{\n    static {{ Loader.load(); }}\n",
                base.target_name
            ));
            header.push_str(&constructors_text(&name, &analysis));
            header.push_str(&casts);
            list.spacing = Some(spacing);
            decl.text = list.rescan(&format!("{}{header}\n", decl.text));
            list.spacing = None;
        }
        decl.text.push_str(&member_text);
        if !anonymous {
            let closing = self.get();
            decl.text.push_str(&closing.spacing);
            decl.text.push('}');
        }
        let mut token = self.next();
        while !token.is_eof() {
            if token.is(";") {
                decl.text.push_str(&token.spacing);
                break;
            }
            token = self.next();
        }
        self.next();

        decl.ty = Some(ty);
        if let Some(text) = info.as_ref().and_then(|i| i.target_text.clone()) {
            decl.text = text;
            decl.custom = true;
        }
        list.add(decl, self.info_map);
        Ok(true)
    }

    /// `@Name` when the peer class is renamed, or `@Namespace` at namespace
    /// scope.
    fn scope_annotation(&self, context: &Context, name: &str, cpp_name: &str) -> String {
        let full_name = match &context.namespace {
            Some(ns) => format!("{ns}::{name}"),
            None => name.to_string(),
        };
        if full_name != cpp_name {
            format!("@Name(\"{cpp_name}\") ")
        } else {
            namespace_annotation(context)
        }
    }

    /// Variables declared after the closing brace of an anonymous struct.
    fn trailing_variables(&mut self) -> Vec<Declarator> {
        let back = self.tokens.index;
        let mut variables = Vec::new();
        let mut current = Declarator::default();
        let mut token = self.get();
        while !token.is_eof() {
            if token.is("*") {
                current.indirections += 1;
            } else if token.is("[") {
                current.dims.push(self.get_at(1).text.parse().unwrap_or(-1));
            } else if token.is_ident() && current.cpp_name.is_empty() {
                current.cpp_name = token.text.to_string();
                current.target_name = token.text.to_string();
            } else if token.is_any(&[",", ";"]) {
                if !current.cpp_name.is_empty() {
                    variables.push(std::mem::take(&mut current));
                }
                if token.is(";") {
                    break;
                }
            }
            token = self.next();
        }
        self.tokens.index = back;
        variables
    }

    /// Moves past the body and the declarators that follow it.
    fn finish_group(&mut self, start: usize) {
        self.tokens.index = start;
        self.body();
        self.skip_statement();
    }
}

/// Constructors a peer class gets beyond those the class declares.
fn constructors_text(name: &str, members: &Members) -> String {
    let array = format!(
        "    public {name}(long size) {{ super((Pointer)null); allocateArray(size); }}\n    private native void allocateArray(long size);\n    @Override public {name} position(long position) {{\n        return ({name})super.position(position);\n    }}\n"
    );
    if members.implicit_constructor {
        return format!(
            "    public {name}() {{ super((Pointer)null); allocate(); }}\n    public {name}(Pointer p) {{ super(p); }}\n    private native void allocate();\n{array}"
        );
    }
    let mut text = String::new();
    if !members.default_constructor || members.abstract_class {
        text.push_str(&format!("    public {name}() {{ super((Pointer)null); }}\n"));
    }
    text.push_str(&format!("    public {name}(Pointer p) {{ super(p); }}\n"));
    if members.default_constructor && !members.abstract_class && !members.size_constructor {
        text.push_str(&array);
    }
    text
}
