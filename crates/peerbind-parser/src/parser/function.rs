//! Functions, methods, constructors and operators.

use super::{capitalize, namespace_annotation, qualify_local, DeclaratorOptions, Parser};
use crate::ast::{Declaration, Declarator, Parameters, Type};
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;
use crate::info::Info;
use crate::token::Keyword;
use std::sync::Arc;

/// Upper bound on the alternative target names tried per parameter.
const MAX_ALTERNATIVES: isize = 32;

/// Accessor role guessed for a member function in a `beanify` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accessor {
    Getter,
    Setter,
    Allocator,
}

impl Parser<'_> {
    pub(crate) fn function(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let spacing = self.get().spacing.to_string();
        let friend = self.get().is_keyword(Keyword::Friend);
        if friend {
            self.next();
        }
        let start = self.tokens.index;
        let Some(ty) = self.parse_type(context)? else {
            return Ok(false);
        };
        let invocation = self.get().is("(");
        let params = self.parameters(context, 0, usize::MAX)?;
        if ty.target_name.is_empty() {
            return Ok(false);
        } else if context.group.is_none() && !ty.operator && invocation {
            // an out-of-line constructor, or a macro invocation
            if params.is_none() {
                self.skip_parentheses();
            }
            self.skip_body();
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }

        self.tokens.index = start;
        let Some(dcl) = self.function_declarator(context, 0, usize::MAX)? else {
            return Ok(false);
        };
        let Some(parameters) = &dcl.parameters else {
            return Ok(false);
        };
        if dcl.cpp_name.is_empty() || dcl.ty.target_name.is_empty() {
            return Ok(false);
        }

        let info = self.function_info(&dcl.cpp_name, parameters);
        let local_name = match &context.namespace {
            Some(ns) => dcl.cpp_name.strip_prefix(&format!("{ns}::")).unwrap_or(&dcl.cpp_name),
            None => &dcl.cpp_name,
        };
        if friend || (context.group.is_none() && local_name.contains("::")) || info.as_ref().is_some_and(|i| i.skip) {
            self.skip_definition()?;
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }

        let modifiers = if (ty.static_member && !context.objectify) || context.group.is_none() {
            "public static native "
        } else {
            "public native "
        };
        let defaults = parameters.defaults;

        let mut previous: Vec<String> = Vec::new();
        let mut first = true;
        'variants: for info_number in -1..MAX_ALTERNATIVES {
            let keeps = std::iter::once(usize::MAX).chain((0..defaults).rev());
            for (variant, keep) in keeps.enumerate() {
                self.tokens.index = start;
                let Some(dcl) = self.function_declarator(context, info_number, keep)? else {
                    break 'variants;
                };
                let Some(parameters) = dcl.parameters.clone() else {
                    break 'variants;
                };

                let mut decl = Declaration {
                    function: true,
                    ..Declaration::new()
                };
                let mut deleted = false;
                self.trailing_qualifiers(&mut decl, &mut deleted)?;

                let mut modifiers = modifiers.to_string();
                if context.virtualize && (decl.abstract_member || dcl.ty.virtual_member) {
                    let access = if context.inaccessible { "protected" } else { "public" };
                    let kind = if decl.abstract_member { "abstract" } else { "native" };
                    modifiers = format!("@Virtual {access} {kind} ");
                }

                decl.text = namespace_annotation(context);
                if dcl.ty.constructor {
                    decl.text.push_str(&format!(
                        "public {}{} {{ super((Pointer)null); allocate{}; }}\nprivate native void allocate{};\n",
                        dcl.target_name, parameters.list, parameters.names, parameters.list
                    ));
                } else {
                    let mut annotations = dcl.ty.annotations.clone();
                    if context.const_variant && decl.const_member {
                        annotations = format!("@Const({{false, false, true}}) {annotations}");
                    }
                    let mut name = dcl.target_name.clone();
                    match self.accessor(context, &dcl, info.as_deref()) {
                        Some((Accessor::Allocator, _)) => modifiers = format!("@Allocator {modifiers}"),
                        Some((_, Some(renamed))) => {
                            if !annotations.contains("@Name(") {
                                let local = dcl.cpp_name.rsplit("::").next().unwrap_or(&dcl.cpp_name);
                                annotations = format!("@Name(\"{local}\") {annotations}");
                            }
                            name = renamed;
                        }
                        _ => {}
                    }
                    decl.text.push_str(&format!(
                        "{modifiers}{annotations}{} {name}{};\n",
                        dcl.ty.target_name, parameters.list
                    ));
                }
                decl.signature = dcl.signature.clone();

                if let Some(text) = info.as_ref().and_then(|i| i.target_text.clone()) {
                    if !first {
                        break 'variants;
                    }
                    decl.text = text;
                    decl.custom = true;
                }
                let comment = self.comment_after();
                if first {
                    first = false;
                    list.spacing = Some(spacing.clone());
                    decl.text = comment + &decl.text;
                }

                let found = previous.contains(&dcl.signature);
                let signature = dcl.signature.clone();
                if !dcl.target_name.is_empty() && !found && !dcl.ty.destructor && !deleted {
                    let stop = context.virtualize && decl.abstract_member;
                    decl.declarator = Some(dcl);
                    list.add(decl, self.info_map);
                    if stop {
                        break 'variants;
                    }
                } else if found && info_number > 0 && variant == 0 {
                    break 'variants;
                }
                previous.push(signature);
            }
        }
        list.spacing = None;
        Ok(true)
    }

    /// Parses the declarator of a function. Constructors, destructors and
    /// conversion operators have no separate name and are built from their type.
    fn function_declarator(&mut self, context: &Context, info_number: isize, keep_defaults: usize) -> Result<Option<Declarator>> {
        let back = self.tokens.index;
        let Some(ty) = self.parse_type(context)? else {
            return Ok(None);
        };
        let mut dcl = if ty.constructor || ty.destructor || ty.operator {
            let Some(params) = self.parameters(context, info_number, keep_defaults)? else {
                return Ok(None);
            };
            special_declarator(ty, params)
        } else {
            self.tokens.index = back;
            let options = DeclaratorOptions::default()
                .info_number(info_number)
                .keep_defaults(keep_defaults);
            let Some(dcl) = self.declarator(context, options)? else {
                return Ok(None);
            };
            dcl
        };
        if !dcl.cpp_name.is_empty() {
            dcl.cpp_name = qualify_local(context, &dcl.cpp_name);
        }
        Ok(Some(dcl))
    }

    /// The rule for `name(T1, T2&)`, falling back to the rule for `name`.
    fn function_info(&self, cpp_name: &str, parameters: &Parameters) -> Option<Arc<Info>> {
        let types: Vec<String> = parameters
            .declarators
            .iter()
            .map(|d| {
                let mut t = d.ty.cpp_name.clone();
                t.push_str(&"*".repeat(d.indirections as usize));
                if d.reference {
                    t.push('&');
                }
                t
            })
            .collect();
        self.info_map
            .get_first(&format!("{cpp_name}({})", types.join(", ")))
            .or_else(|| self.info_map.get_first(cpp_name))
    }

    /// Consumes qualifiers after the parameter list, a pure or deleted
    /// specifier, and the body or terminating semicolon.
    fn trailing_qualifiers(&mut self, decl: &mut Declaration, deleted: &mut bool) -> Result<()> {
        loop {
            let token = self.get();
            if token.is_eof() {
                break;
            }
            decl.const_member |= token.is_keyword(Keyword::Const);
            if token.is("->") {
                let mut token = self.next();
                while !token.is_eof() && !token.is_any(&["{", ";", "="]) {
                    token = self.next();
                }
                break;
            }
            if self.attribute()?.is_none() {
                break;
            }
        }
        if self.get().is("=") {
            let value = self.next();
            decl.abstract_member = value.is("0");
            *deleted = value.is_keyword(Keyword::Delete);
            self.next();
        }
        self.skip_body();
        Ok(())
    }

    /// Skips trailing qualifiers and whatever is left of a function.
    pub(crate) fn skip_definition(&mut self) -> Result<()> {
        while self.get().is_word() && self.attribute()?.is_some() {}
        self.skip_body();
        Ok(())
    }

    /// Skips member initializers or `= value`, then the body or the
    /// terminating semicolon.
    /// Advances past a balanced `(...)` group.
    fn skip_parentheses(&mut self) {
        let mut depth = 0usize;
        let mut token = self.get();
        while !token.is_eof() {
            if token.is("(") {
                depth += 1;
            } else if token.is(")") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.next();
                    break;
                }
            }
            token = self.next();
        }
    }

    fn skip_body(&mut self) {
        let mut token = self.get();
        if token.is_any(&[":", "="]) {
            let mut previous = token.clone();
            token = self.next();
            while !token.is_eof() && !token.is(";") {
                if token.is("(") {
                    let mut depth = 0;
                    while !token.is_eof() {
                        if token.is("(") {
                            depth += 1;
                        } else if token.is(")") {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        token = self.next();
                    }
                } else if token.is("{") {
                    if !(previous.is_word() || previous.is(">")) {
                        break;
                    }
                    self.body();
                    previous = self.get_at(-1);
                    token = self.get();
                    continue;
                }
                previous = token;
                token = self.next();
            }
        }
        if !self.body() && self.get().is(";") {
            self.next();
        }
    }

    /// Guesses the accessor role of a member function in a `beanify` scope
    /// and the bean-style name it should get, if any.
    fn accessor(&mut self, context: &Context, dcl: &Declarator, info: Option<&Info>) -> Option<(Accessor, Option<String>)> {
        let group = context.group.as_ref()?;
        if !context.beanify || dcl.ty.operator || info.is_some_and(|i| i.target_names.is_some()) {
            return None;
        }
        let arity = dcl.parameters.as_ref().map_or(0, |p| p.declarators.len());
        let returns_void = dcl.ty.target_name == "void" && dcl.indirections == 0;
        let name = dcl.target_name.as_str();

        let mut roles = Vec::new();
        if arity == 0 && !returns_void {
            roles.push(Accessor::Getter);
        }
        if arity == 1 && (returns_void || dcl.ty.target_name == group.target_name) {
            roles.push(Accessor::Setter);
        }
        if dcl.indirections > 0 && ["create", "new", "alloc", "make"].iter().any(|p| name.starts_with(p)) {
            roles.push(Accessor::Allocator);
        }
        let role = *roles.first()?;
        if roles.len() > 1 {
            let message = format!("'{}' looks like more than one kind of accessor; treating it as {role:?}", dcl.cpp_name);
            let location = self.get().location();
            self.warn(location, message);
        }

        let renamed = match role {
            Accessor::Getter if !name.starts_with("get") && !name.starts_with("is") => Some(format!("get{}", capitalize(name))),
            Accessor::Setter if !name.starts_with("set") => Some(format!("set{}", capitalize(name))),
            _ => None,
        };
        Some((role, renamed))
    }
}

/// Declarator for a constructor, destructor or conversion operator.
fn special_declarator(ty: Type, params: Parameters) -> Declarator {
    let mut dcl = Declarator {
        cpp_name: ty.cpp_name.clone(),
        target_name: ty.target_name.rsplit(' ').next().unwrap_or_default().to_string(),
        ..Declarator::default()
    };
    if ty.operator {
        dcl.cpp_name = format!("operator {}", dcl.cpp_name);
        dcl.target_name = format!("as{}", capitalize(&dcl.target_name));
    }
    dcl.signature = format!("{}{}", dcl.target_name, params.signature);
    dcl.parameters = Some(params);
    dcl.ty = ty;
    dcl
}

#[cfg(test)]
mod tests {
    use crate::ast::Type;
    use crate::context::Context;
    use crate::declaration_list::DeclarationList;
    use crate::info::Info;
    use crate::info_map::InfoMap;
    use crate::parser::Parser;
    use peerbind_common::Diagnostic;

    fn parse(map: &mut InfoMap, text: &str) -> DeclarationList {
        let mut list = DeclarationList::new();
        Parser::from_text(map, text).parse(&Context::new(), &mut list).unwrap();
        list
    }

    fn parse_bean(map: &mut InfoMap, text: &str) -> (Vec<String>, Vec<Diagnostic>) {
        let context = Context {
            group: Some(Type::named("Dev")),
            beanify: true,
            ..Context::new()
        };
        let mut list = DeclarationList::new();
        let mut parser = Parser::from_text(map, text);
        parser.parse(&context, &mut list).unwrap();
        let warnings = parser.warnings().to_vec();
        (list.iter().map(|d| d.text.trim().to_string()).collect(), warnings)
    }

    #[test]
    fn test_default_argument_variants() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "void f(int a, float b = 1.0f);");
        let signatures: Vec<_> = list.iter().map(|d| d.signature.as_str()).collect();
        assert_eq!(signatures, ["f_int_float", "f_int"]);
        assert_eq!(
            list.text(),
            "public static native void f(int a, float b/*=1.0f*/);\npublic static native void f(int a);"
        );
    }

    #[test]
    fn test_string_alternative() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "int puts(const char* s);");
        assert_eq!(
            list.text(),
            "public static native int puts(@Cast(\"const char*\") BytePointer s);\npublic static native int puts(String s);"
        );
    }

    #[test]
    fn test_pointer_pointer_variants() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "void g(float** p);");
        // later variants start on a line of their own
        assert!(list.iter().skip(1).all(|d| d.text.starts_with('\n')));
        let texts: Vec<_> = list.iter().map(|d| d.text.trim()).collect();
        assert_eq!(texts[0], "public static native void g(@Cast(\"float**\") PointerPointer p);");
        assert_eq!(texts[1], "public static native void g(@ByPtrPtr FloatPointer p);");
        assert!(texts.contains(&"public static native void g(@ByPtrPtr FloatBuffer p);"));
        assert!(texts.contains(&"public static native void g(@ByPtrPtr float[] p);"));
    }

    #[test]
    fn test_skipped_function() {
        let mut map = InfoMap::new();
        map.put(Info::new(["hidden"]).skip(true));
        let list = parse(&mut map, "void hidden(int x) { return; }\nvoid shown();");
        assert_eq!(list.text().trim(), "public static native void shown();");
    }

    #[test]
    fn test_out_of_line_definition_skipped() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "Foo::Foo(int x) : x_(x), y_{0} { }\nint Foo::get() const { return x_; }");
        assert!(list.iter().all(|d| d.text.trim().is_empty()));
    }

    #[test]
    fn test_deleted_and_defaulted() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "void copy() = delete;\nvoid move() = default;");
        assert_eq!(list.text().trim(), "public static native void move();");
    }

    #[test]
    fn test_target_text_replaces_declaration() {
        let mut map = InfoMap::new();
        map.put(Info::new(["custom"]).target_text("public static native void custom(Pointer p);\n"));
        let list = parse(&mut map, "void custom(void* p, int n = 0);");
        assert_eq!(list.len(), 1);
        assert!(list.iter().next().unwrap().custom);
    }

    #[test]
    fn test_getter_is_renamed() {
        let mut map = InfoMap::new();
        let (texts, warnings) = parse_bean(&mut map, "int size();");
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("@Name(\"size\")"));
        assert!(texts[0].ends_with("int getSize();"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_setter_is_renamed() {
        let mut map = InfoMap::new();
        let (texts, _) = parse_bean(&mut map, "void width(int w);");
        assert!(texts[0].contains("@Name(\"width\")"));
        assert!(texts[0].contains("void setWidth(int w)"));
    }

    #[test]
    fn test_existing_accessor_names_are_kept() {
        let mut map = InfoMap::new();
        let (texts, _) = parse_bean(&mut map, "int isOpen();\nvoid setMode(int m);");
        assert_eq!(texts, ["public native int isOpen();", "public native void setMode(int m);"]);
    }

    #[test]
    fn test_ambiguous_accessor_warns() {
        let mut map = InfoMap::new();
        let (texts, warnings) = parse_bean(&mut map, "Dev* create();");
        assert!(texts[0].contains("getCreate()"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("more than one kind of accessor"));
    }

    #[test]
    fn test_plain_scope_keeps_names() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "int size();");
        assert_eq!(list.iter().next().unwrap().text.trim(), "public static native int size();");
    }

    #[test]
    fn test_macro_invocation_with_literals_is_skipped() {
        let mut map = InfoMap::new();
        let list = parse(&mut map, "DECLARE_TYPE(1, 2);\nint f();");
        let texts: Vec<_> = list.iter().map(|d| d.text.trim()).filter(|t| !t.is_empty()).collect();
        assert_eq!(texts, ["public static native int f();"]);
    }
}
