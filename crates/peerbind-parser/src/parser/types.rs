//! Template parameter lists, template argument lists and type references.

use super::Parser;
use crate::ast::{Attribute, Type};
use crate::context::Context;
use crate::error::Result;
use crate::info_map::SIMPLE_TYPES;
use crate::template::{TemplateMap, TemplateOwner};
use crate::token::Keyword;
use std::sync::Arc;

/// Words that may precede or decorate a type without changing its name.
const DECORATIONS: [Keyword; 14] = [
    Keyword::Enum,
    Keyword::Explicit,
    Keyword::Extern,
    Keyword::Inline,
    Keyword::Class,
    Keyword::Struct,
    Keyword::Union,
    Keyword::Typedef,
    Keyword::Typename,
    Keyword::Using,
    Keyword::Constexpr,
    Keyword::Mutable,
    Keyword::Volatile,
    Keyword::ThreadLocal,
];

/// What the type loop does after looking at a token.
enum Step {
    /// Consume the token and look at the next one.
    Next,
    /// The token was consumed by a nested parse already.
    Stay,
    Stop,
}

impl Parser<'_> {
    /// Parses `template<...>` into a new map chained to the context's one.
    /// Parameters are declared unbound; defaults are skipped.
    pub(crate) fn template(&mut self, context: &Context) -> Result<Option<TemplateMap>> {
        if !self.get().is_keyword(Keyword::Template) {
            return Ok(None);
        }
        let mut map = TemplateMap::new(context.template_map.clone());

        self.next().expect(&["<"])?;
        let mut token = self.next();
        while !token.is_eof() {
            if token.is_word() {
                let mut key = self.next();
                let variadic = key.is("...");
                if variadic {
                    key = self.next();
                }
                if key.is_word() && !key.is_keyword(Keyword::Template) {
                    if variadic {
                        map.declare_variadic(key.text.as_str());
                    } else {
                        map.declare(key.text.as_str());
                    }
                    token = self.next();
                } else {
                    token = key;
                }
            }
            if !token.is_any(&[",", ">"]) {
                let mut count = 0;
                token = self.get();
                while !token.is_eof() {
                    if count == 0 && token.is_any(&[",", ">"]) {
                        break;
                    } else if token.is_any(&["<", "("]) {
                        count += 1;
                    } else if token.is_any(&[">", ")"]) {
                        count -= 1;
                    }
                    token = self.next();
                }
            }
            if token.expect(&[",", ">"])?.is(">") {
                if self.next().is_keyword(Keyword::Template) {
                    self.next().expect(&["<"])?;
                } else {
                    break;
                }
            }
            token = self.next();
        }
        Ok(Some(map))
    }

    /// Parses `<...>` into argument types. Arguments that are expressions
    /// rather than types keep their text as the native name.
    pub(crate) fn template_arguments(&mut self, context: &Context) -> Result<Option<Vec<Type>>> {
        if !self.get().is("<") {
            return Ok(None);
        }
        let mut arguments = Vec::new();
        let mut token = self.next();
        while !token.is_eof() {
            let mut ty = self.parse_type(context)?.unwrap_or_else(|| Type::named("..."));
            token = self.get();
            if !token.is_any(&[",", ">"]) {
                let mut count = 0;
                while !token.is_eof() {
                    if count == 0 && token.is_any(&[",", ">"]) {
                        break;
                    } else if token.is_any(&["<", "("]) {
                        count += 1;
                    } else if token.is_any(&[">", ")"]) {
                        count -= 1;
                    }
                    ty.cpp_name.push_str(&token.text);
                    token = self.next();
                }
                if ty.cpp_name.ends_with('*') {
                    ty.target_name = "PointerPointer".to_string();
                    ty.annotations.push_str(&format!("@Cast(\"{}*\") ", ty.cpp_name));
                }
            }
            arguments.push(ty);
            if token.expect(&[",", ">"])?.is(">") {
                break;
            }
            token = self.next();
        }
        Ok(Some(arguments))
    }

    /// Parses a type reference and resolves it through the rule table.
    ///
    /// Returns `None` for a bare `...`.
    pub(crate) fn parse_type(&mut self, context: &Context) -> Result<Option<Type>> {
        let mut ty = Type::default();
        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let token = self.get();
            if token.is_eof() {
                break;
            }
            let step = if token.is("::") {
                ty.cpp_name.push_str("::");
                Step::Next
            } else if token.is_keyword(Keyword::Decltype) {
                ty.cpp_name.push_str("decltype");
                self.decltype(&mut ty.cpp_name);
                Step::Next
            } else if token.is("<") {
                let arguments = self.template_arguments(context)?.unwrap_or_default();
                self.push_arguments(&mut ty.cpp_name, &arguments);
                ty.arguments = Some(arguments);
                Step::Next
            } else if token.is_keyword(Keyword::Const) {
                if ty.cpp_name.is_empty() {
                    ty.const_value = true;
                } else {
                    ty.const_pointer = true;
                }
                Step::Next
            } else if token.is("*") {
                ty.indirections += 1;
                self.next();
                Step::Stop
            } else if token.is("&") {
                ty.reference = true;
                self.next();
                Step::Stop
            } else if token.is("&&") {
                ty.reference = true;
                ty.rvalue = true;
                self.next();
                Step::Stop
            } else if token.is("~") && !context.c_only {
                ty.destructor = true;
                Step::Next
            } else if token.is_keyword(Keyword::Static) {
                ty.static_member = true;
                Step::Next
            } else if token.is_keyword(Keyword::Operator) && !context.c_only {
                if ty.cpp_name.is_empty() {
                    ty.operator = true;
                    Step::Next
                } else if ty.cpp_name.ends_with("::") {
                    ty.operator = true;
                    self.next();
                    Step::Stop
                } else {
                    Step::Stop
                }
            } else if token.is_keyword(Keyword::Virtual) {
                ty.virtual_member = true;
                Step::Next
            } else if token.is_any_keyword(&DECORATIONS) {
                Step::Next
            } else if SIMPLE_TYPES.contains(&token.text.as_str()) {
                ty.cpp_name.push_str(&token.text);
                ty.cpp_name.push(' ');
                ty.simple = true;
                Step::Next
            } else if token.is("[") && self.get_at(1).is("[") {
                attributes.push(self.bracket_attribute());
                Step::Stay
            } else if token.is_word() {
                let back = self.tokens.index;
                match self.attribute()? {
                    Some(attr) if attr.annotation => {
                        ty.annotations.push_str(&attr.target_name);
                        attributes.push(attr);
                        Step::Stay
                    }
                    _ => {
                        self.tokens.index = back;
                        if ty.cpp_name.is_empty() || ty.cpp_name.ends_with("::") {
                            ty.cpp_name.push_str(&token.text);
                            Step::Next
                        } else {
                            let following = self.get_at(1);
                            let annotation = self
                                .info_map
                                .get_first(&following.text)
                                .is_some_and(|info| info.annotations.is_some());
                            if annotation || !(following.is_any(&["*", "&", "&&"]) || following.is_word()) {
                                Step::Stop
                            } else {
                                Step::Next
                            }
                        }
                    }
                }
            } else {
                if token.is("}") {
                    ty.anonymous = true;
                    self.next();
                }
                Step::Stop
            };
            match step {
                Step::Next => {
                    self.next();
                }
                Step::Stay => {}
                Step::Stop => break,
            }
        }
        ty.attributes = attributes;
        ty.cpp_name = ty.cpp_name.trim().to_string();

        if self.get().is("...") {
            self.next();
            if ty.cpp_name.is_empty() {
                return Ok(None);
            }
        } else if ty.operator {
            loop {
                let token = self.get();
                if token.is_eof() || token.is("(") {
                    break;
                }
                ty.cpp_name.push_str(&token.text);
                self.next();
            }
        }
        strip_indirections(&mut ty);

        if let Some(map) = &context.template_map {
            if let Some(bound) = substitute(map, &ty.cpp_name) {
                ty.cpp_name = bound;
                if let Some(rest) = ty.cpp_name.strip_prefix("const ") {
                    ty.cpp_name = rest.to_string();
                    ty.const_value = true;
                }
                strip_indirections(&mut ty);
                if let Some(rest) = ty.cpp_name.strip_suffix(" const") {
                    ty.cpp_name = rest.to_string();
                    ty.const_pointer = true;
                }
            }
        }

        let mut info = None;
        for name in context.qualify(&ty.cpp_name, &self.using_list) {
            if let Some(found) = self.info_map.get_first_with(&name, false) {
                ty.cpp_name = name;
                info = Some(found);
                break;
            } else if self.info_map.get_first(&name).is_some() {
                ty.cpp_name = name;
            }
        }

        let scope = ty.cpp_name.rfind("::");
        let template = ty.cpp_name.rfind('<');
        ty.target_name = match (scope, template) {
            (Some(i), None) => ty.cpp_name[i + 2..].to_string(),
            _ => ty.cpp_name.clone(),
        };

        let mut value_type = false;
        if let Some(info) = &info {
            let plain = ty.indirections == 0 && !ty.reference;
            match (&info.value_types, &info.pointer_types) {
                (Some(values), _) if plain && !values.is_empty() => {
                    ty.target_name = values[0].clone();
                    ty.target_names = values.clone();
                    value_type = true;
                }
                (_, Some(pointers)) if !pointers.is_empty() => {
                    ty.target_name = pointers[0].clone();
                    ty.target_names = pointers.clone();
                }
                _ => {}
            }
        }

        if ty.operator {
            if ty.const_value {
                ty.annotations.push_str("@Const ");
            }
            if !value_type && ty.indirections == 0 {
                ty.annotations.push_str(if ty.reference { "@ByRef " } else { "@ByVal " });
            }
            let suffix = if ty.indirections > 0 {
                "*"
            } else if ty.reference {
                "&"
            } else {
                ""
            };
            ty.annotations.push_str(&format!(
                "@Name(\"operator {}{}{suffix}\") ",
                if ty.const_value { "const " } else { "" },
                ty.cpp_name
            ));
        }
        if let Some(info) = &info {
            ty.annotations.push_str(&info.annotation_text());
        }

        if let Some(group) = &context.group {
            if !ty.target_name.is_empty() {
                let mut group_name = group.cpp_name.as_str();
                if template.is_none() {
                    if let Some(i) = group_name.rfind('<') {
                        group_name = &group_name[..i];
                    }
                }
                if ty.cpp_name == group_name && !context.c_only {
                    ty.constructor = !ty.destructor
                        && !ty.operator
                        && ty.indirections == 0
                        && !ty.reference
                        && self.get().is_any(&["(", ":"]);
                }
                ty.target_name = context.shorten(&ty.target_name);
            }
        }
        Ok(Some(ty))
    }

    /// Copies a balanced `decltype(...)` operand into `out`.
    fn decltype(&mut self, out: &mut String) {
        if !self.get_at(1).is("(") {
            return;
        }
        let mut token = self.next();
        let mut depth = 0;
        while !token.is_eof() {
            out.push_str(&token.text);
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
    }

    /// Appends `<A,B>` spelled with the native types the arguments map to.
    fn push_arguments(&mut self, cpp_name: &mut String, arguments: &[Type]) {
        cpp_name.push('<');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                cpp_name.push(',');
            }
            let mut spelled = arg.clone();
            if let Some(native) = self.info_map.get_first(&arg.cpp_name) {
                if let Some(t) = native.first_cpp_type() {
                    spelled.cpp_name = t.to_string();
                }
            }
            cpp_name.push_str(&spelled.cpp_spelling());
        }
        cpp_name.push_str(if cpp_name.ends_with('>') { " >" } else { ">" });
    }
}

/// Hoists trailing `*` and `&` of the native name into the type's fields.
fn strip_indirections(ty: &mut Type) {
    if let Some(rest) = ty.cpp_name.strip_suffix("&&") {
        ty.cpp_name = rest.to_string();
        ty.reference = true;
        ty.rvalue = true;
    } else if let Some(rest) = ty.cpp_name.strip_suffix('&') {
        ty.cpp_name = rest.to_string();
        ty.reference = true;
    }
    while let Some(rest) = ty.cpp_name.strip_suffix('*') {
        ty.cpp_name = rest.to_string();
        ty.indirections += 1;
    }
    ty.cpp_name.truncate(ty.cpp_name.trim_end().len());
}

/// The native name with template parameters replaced by their bindings,
/// either as a whole or segment by segment, as in `T::value_type`.
fn substitute(map: &Arc<TemplateMap>, cpp_name: &str) -> Option<String> {
    if let Some(bound) = map.get(cpp_name) {
        return Some(bound);
    }
    if cpp_name.contains('<') || !cpp_name.contains("::") {
        return None;
    }
    let mut changed = false;
    let segments: Vec<String> = cpp_name
        .split("::")
        .map(|segment| match map.get(segment) {
            Some(bound) => {
                changed = true;
                bound
            }
            None => segment.to_string(),
        })
        .collect();
    changed.then(|| segments.join("::"))
}

/// Whether the template being instantiated is a class template.
pub(crate) fn in_class_template(context: &Context) -> bool {
    context
        .template_map
        .as_ref()
        .is_some_and(|m| matches!(m.owner(), Some(TemplateOwner::Type(_))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Info;
    use crate::info_map::InfoMap;

    fn parse_type(map: &mut InfoMap, text: &str, context: &Context) -> Type {
        Parser::from_text(map, text).parse_type(context).unwrap().unwrap()
    }

    #[test]
    fn test_simple_type_with_pointer() {
        let mut map = InfoMap::new();
        let ty = parse_type(&mut map, "const unsigned char* p", &Context::new());
        assert_eq!(ty.cpp_name, "unsigned char");
        assert!(ty.const_value);
        assert_eq!(ty.indirections, 1);
        assert!(ty.simple);
    }

    #[test]
    fn test_rule_maps_target_name() {
        let mut map = InfoMap::new();
        map.put(Info::new(["ns::Widget"]).pointer_types(["Widget"]));
        let ctx = Context {
            namespace: Some("ns".to_string()),
            ..Context::new()
        };
        let ty = parse_type(&mut map, "Widget& w", &ctx);
        assert_eq!(ty.cpp_name, "ns::Widget");
        assert_eq!(ty.target_name, "Widget");
        assert!(ty.reference);
    }

    #[test]
    fn test_value_type_only_without_indirection() {
        let mut map = InfoMap::new();
        let ty = parse_type(&mut map, "int x", &Context::new());
        assert_eq!(ty.target_name, "int");
        let ty = parse_type(&mut map, "int* x", &Context::new());
        assert_eq!(ty.target_name, "IntPointer");
    }

    #[test]
    fn test_template_arguments() {
        let mut map = InfoMap::new();
        let ty = parse_type(&mut map, "std::map<int, std::vector<float>> m", &Context::new());
        assert_eq!(ty.cpp_name, "std::map<int,std::vector<float> >");
        let args = ty.arguments.unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].cpp_name, "std::vector<float>");
    }

    #[test]
    fn test_expression_template_argument() {
        let mut map = InfoMap::new();
        let ty = parse_type(&mut map, "Array<N + 1> a", &Context::new());
        assert_eq!(ty.arguments.unwrap()[0].cpp_name, "N+1");
    }

    #[test]
    fn test_template_substitution() {
        let mut map = InfoMap::new();
        let mut template = TemplateMap::new(None);
        template.declare("T");
        template.bind("T", Type::named("float"));
        let ctx = Context {
            template_map: Some(Arc::new(template)),
            ..Context::new()
        };
        let ty = parse_type(&mut map, "const T* p", &ctx);
        assert_eq!(ty.cpp_name, "float");
        assert_eq!(ty.target_name, "FloatPointer");
        assert!(ty.const_value);
    }

    #[test]
    fn test_lone_ellipsis() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "...)");
        assert!(parser.parse_type(&Context::new()).unwrap().is_none());
        assert!(parser.get().is(")"));
    }

    #[test]
    fn test_annotation_macro_folds_in() {
        let mut map = InfoMap::new();
        map.put(Info::new(["MY_EXPORT"]).annotations(["@Export"]));
        let ty = parse_type(&mut map, "MY_EXPORT int f", &Context::new());
        assert_eq!(ty.cpp_name, "int");
        assert_eq!(ty.annotations, "@Export ");
    }

    #[test]
    fn test_constructor_detection() {
        let mut map = InfoMap::new();
        let ctx = Context {
            group: Some(Type::named("Foo")),
            ..Context::new()
        };
        let ty = parse_type(&mut map, "Foo(int x);", &ctx);
        assert!(ty.constructor);
        let ctx = Context { c_only: true, ..ctx };
        let ty = parse_type(&mut map, "~Foo();", &ctx);
        assert!(!ty.destructor);
    }

    #[test]
    fn test_conversion_operator() {
        let mut map = InfoMap::new();
        let ty = parse_type(&mut map, "operator bool() const;", &Context::new());
        assert!(ty.operator);
        assert_eq!(ty.cpp_name, "bool");
        assert!(ty.annotations.contains("@Name(\"operator bool\")"));
    }

    #[test]
    fn test_template_parameters() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(
            &mut map,
            "template<typename T, int N = 4, class... Rest> struct S;",
        );
        let template = parser.template(&Context::new()).unwrap().unwrap();
        assert_eq!(template.names().collect::<Vec<_>>(), ["T", "N", "Rest"]);
        assert!(template.is_variadic("Rest"));
        assert!(parser.get().is_keyword(Keyword::Struct));
    }
}
