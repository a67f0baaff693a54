//! Declarators: the name, indirections, array dimensions and parameter
//! list that turn a type into a variable, function or function pointer.

use super::{capitalize, Parser};
use crate::ast::{Declaration, Declarator};
use crate::context::Context;
use crate::error::Result;
use crate::parser::types::in_class_template;
use crate::tokenizer::decode_integer;
use crate::token::{Keyword, Token};

/// How [`Parser::declarator`] should shape its result.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeclaratorOptions<'n> {
    /// Name to use when the declarator has none, as for unnamed parameters.
    pub default_name: Option<&'n str>,
    /// Which alternative target name of the type's rule to use. Negative
    /// disables `@ByPtrPtr` so that `T**` maps to `PointerPointer`.
    pub info_number: isize,
    /// How many defaulted parameters to keep; `usize::MAX` keeps all.
    pub keep_defaults: usize,
    /// Which declarator of a comma-separated list to parse.
    pub var_number: usize,
    /// Map arrays to pointers to their elements.
    pub array_as_pointer: bool,
    /// Map a pointer beyond the first level to an array dimension.
    pub pointer_as_array: bool,
}

impl Default for DeclaratorOptions<'_> {
    fn default() -> Self {
        Self {
            default_name: None,
            info_number: 0,
            keep_defaults: usize::MAX,
            var_number: 0,
            array_as_pointer: false,
            pointer_as_array: false,
        }
    }
}

impl DeclaratorOptions<'_> {
    pub fn info_number(self, info_number: isize) -> Self {
        Self { info_number, ..self }
    }

    pub fn keep_defaults(self, keep_defaults: usize) -> Self {
        Self { keep_defaults, ..self }
    }

    pub fn var_number(self, var_number: usize) -> Self {
        Self { var_number, ..self }
    }

    pub fn array_as_pointer(self) -> Self {
        Self {
            array_as_pointer: true,
            ..self
        }
    }

    pub fn pointer_as_array(self) -> Self {
        Self {
            pointer_as_array: true,
            ..self
        }
    }
}

fn dimension(token: &Token) -> i64 {
    if token.is_integer() {
        decode_integer(token.text.trim_end_matches(['l', 'L', 'u', 'U'])).unwrap_or(-1)
    } else {
        -1
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl Parser<'_> {
    pub(crate) fn declarator(&mut self, context: &Context, options: DeclaratorOptions<'_>) -> Result<Option<Declarator>> {
        let typedef = self.get().is_keyword(Keyword::Typedef);
        let using = self.get().is_keyword(Keyword::Using);
        let Some(mut ty) = self.parse_type(context)? else {
            return Ok(None);
        };
        let mut dcl = Declarator::default();

        let mut depth = 0;
        let mut number = 0;
        let mut token = self.get();
        while number < options.var_number && !token.is_eof() {
            if token.is_any(&["(", "[", "{"]) {
                depth += 1;
            } else if token.is_any(&[")", "]", "}"]) {
                depth -= 1;
            } else if depth > 0 {
            } else if token.is(",") {
                number += 1;
            } else if token.is(";") {
                self.next();
                return Ok(None);
            }
            token = self.next();
        }

        let mut cast = ty.cpp_name.clone();
        if ty.const_pointer {
            dcl.const_pointer = true;
            cast.push_str(" const");
        }
        if options.var_number == 0 && ty.indirections > 0 {
            dcl.indirections += ty.indirections;
            cast.push_str(&"*".repeat(ty.indirections as usize));
        }
        if options.var_number == 0 && ty.reference {
            dcl.reference = true;
            dcl.rvalue = ty.rvalue;
            cast.push_str(if ty.rvalue { "&&" } else { "&" });
        }
        loop {
            let token = self.get();
            if token.is("*") {
                dcl.indirections += 1;
            } else if token.is("&") {
                dcl.reference = true;
            } else if token.is("&&") {
                dcl.reference = true;
                dcl.rvalue = true;
            } else if token.is_keyword(Keyword::Const) {
                dcl.const_pointer = true;
            } else {
                break;
            }
            cast.push_str(&token.text);
            self.next();
        }

        let mut attributes = ty.attributes.clone();
        let mut back = self.tokens.index;
        loop {
            if self.get().is("[") && self.get_at(1).is("[") {
                attributes.push(self.bracket_attribute());
                back = self.tokens.index;
                continue;
            }
            match self.attribute()? {
                Some(attr) if attr.annotation => {
                    ty.annotations.push_str(&attr.target_name);
                    attributes.push(attr);
                    back = self.tokens.index;
                }
                _ => break,
            }
        }
        self.tokens.index = back;
        let hint = attributes
            .iter()
            .find(|a| !a.arguments.is_empty() && is_identifier(&a.arguments))
            .map(|a| a.arguments.clone());

        let mut parens = 0;
        while self.get().is("(") && self.get_at(1).is("(") {
            self.next();
            parens += 1;
        }

        let mut dims: Vec<i64> = Vec::new();
        let mut indirections2 = 0u32;
        let mut member_of = None;
        let mut definition = Declaration::new();
        let mut operator = false;
        if self.get().is("(") || (typedef && self.get_at(1).is("(")) {
            if self.get().is("(") {
                self.next();
            }
            let mut token = self.get();
            while !token.is_eof() {
                if token.is_word() || token.is("::") {
                    dcl.cpp_name.push_str(&token.text);
                } else if token.is("*") {
                    indirections2 += 1;
                    if let Some(scope) = dcl.cpp_name.strip_suffix("::") {
                        let scope = scope.to_string();
                        for name in context.qualify(&scope, &self.using_list) {
                            if let Some(info) = self.info_map.get_first(&name) {
                                member_of = Some(info);
                                break;
                            }
                        }
                        definition.text.push_str(&format!("@Namespace(\"{scope}\") "));
                    } else if !dcl.cpp_name.is_empty() {
                        definition.text.push_str(&format!("@Convention(\"{}\") ", dcl.cpp_name));
                    }
                    dcl.cpp_name.clear();
                } else if token.is("[") {
                    let size = self.get_at(1);
                    dims.push(dimension(&size));
                } else if token.is_any(&["(", ")"]) {
                    break;
                }
                token = self.next();
            }
            if self.get().is(")") {
                self.next();
            }
        } else if self.get().is_word() {
            let mut token = self.get();
            while !token.is_eof() {
                if token.is("::") {
                    dcl.cpp_name.push_str("::");
                } else if token.is_keyword(Keyword::Operator) && !context.c_only {
                    operator = true;
                    dcl.cpp_name.push_str("operator");
                    let symbol = self.next();
                    if symbol.is_word() {
                        dcl.cpp_name.push(' ');
                    }
                    let mut token = symbol;
                    while !token.is_eof() && !(token.is("(") && !dcl.cpp_name.ends_with("operator")) {
                        dcl.cpp_name.push_str(&token.text);
                        token = self.next();
                    }
                    break;
                } else if token.is("<") {
                    dcl.cpp_name.push('<');
                    let mut depth = 0;
                    let mut token = self.next();
                    while !token.is_eof() {
                        dcl.cpp_name.push_str(&token.text);
                        if depth == 0 && token.is(">") {
                            break;
                        } else if token.is("<") {
                            depth += 1;
                        } else if token.is(">") {
                            depth -= 1;
                        }
                        token = self.next();
                    }
                } else if token.is_word() && (dcl.cpp_name.is_empty() || dcl.cpp_name.ends_with("::")) {
                    dcl.cpp_name.push_str(&token.text);
                } else {
                    break;
                }
                token = self.next();
            }
        }
        if dcl.cpp_name.is_empty() {
            if let Some(name) = options.default_name {
                dcl.cpp_name = name.to_string();
            }
        }

        let mut bracket = false;
        let mut token = self.get();
        while !token.is_eof() {
            if !bracket && token.is("[") {
                bracket = true;
                let size = self.get_at(1);
                dims.push(dimension(&size));
            } else if !bracket {
                break;
            } else if token.is("]") {
                bracket = false;
            }
            token = self.next();
        }
        while !dims.is_empty() && indirections2 > 0 {
            dims.push(-1);
            indirections2 -= 1;
        }
        if options.array_as_pointer && !dims.is_empty() {
            dcl.indirections += 1;
            let inner: String = dims[1..].iter().filter(|&&d| d > 0).map(|d| format!("[{d}]")).collect();
            if inner.is_empty() {
                cast.push('*');
            } else {
                cast.push_str(&format!("(*){inner}"));
            }
        }
        let pointer_levels = if ty.anonymous { 0 } else { 1 };
        if options.pointer_as_array && dcl.indirections > pointer_levels {
            dims.push(-1);
            dcl.indirections -= 1;
            cast.pop();
        }
        dcl.dims = dims;

        if self.get().is(":") {
            ty.annotations.push_str("@NoOffset ");
            dcl.bitfield = true;
            let mut token = self.next();
            while !token.is_eof() && !token.is_any(&[",", ";"]) {
                token = self.next();
            }
        }

        let mut info_length = 1;
        let mut value_type = false;
        let mut need_cast = options.array_as_pointer && dcl.dims.len() > 1;
        let mut implicit_const = false;
        let prefix = if ty.const_value && dcl.indirections < 2 && !dcl.reference {
            "const "
        } else {
            ""
        };
        let mut info = self.info_map.get_first_with(&format!("{prefix}{}", ty.cpp_name), false);
        if !typedef && info.as_ref().is_none_or(|i| i.cpp_types.as_ref().is_some_and(|t| !t.is_empty())) {
            let adapter = match info.as_ref().and_then(|i| i.first_cpp_type()) {
                Some(text) => {
                    let text = text.to_string();
                    self.fragment(&text, |p| p.parse_type(context))?
                }
                None => Some(ty.clone()),
            };
            if let Some(adapter) = adapter {
                for info2 in self.info_map.get(&adapter.cpp_name) {
                    let Some(arg) = adapter.arguments.as_ref().and_then(|a| a.first()) else {
                        continue;
                    };
                    if info2.annotations.is_none() {
                        continue;
                    }
                    ty.const_value = arg.const_value;
                    ty.const_pointer = arg.const_pointer;
                    ty.cpp_name = arg.cpp_name.clone();
                    ty.target_name = arg.target_name.clone();
                    ty.annotations = arg.annotations.clone();
                    dcl.indirections = 1;
                    dcl.reference = false;
                    cast = format!("{}*", arg.cpp_name);
                    if arg.const_value {
                        cast = format!("const {cast}");
                    }
                    if arg.const_pointer {
                        cast.push_str(" const");
                    }
                    if arg.indirections > 0 {
                        dcl.indirections += arg.indirections;
                        cast.push_str(&"*".repeat(arg.indirections as usize));
                    }
                    if arg.reference {
                        dcl.reference = true;
                        cast.push('&');
                    }
                    ty.annotations.push_str(&info2.annotation_text());
                    info = self.info_map.get_first_with(&ty.cpp_name, false);
                    break;
                }
            }
        }

        if let (false, Some(info)) = (using, &info) {
            value_type = info.value_types.is_some()
                && ((ty.const_value && dcl.reference)
                    || (dcl.indirections == 0 && !dcl.reference)
                    || info.pointer_types.is_none());
            implicit_const = info.first_cpp_name().starts_with("const ");
            let names = if value_type {
                info.value_types.as_ref()
            } else {
                info.pointer_types.as_ref()
            };
            if let Some(names) = names.filter(|n| !n.is_empty()) {
                info_length = names.len();
                dcl.info_number = options.info_number.max(0) as usize % info_length;
                ty.target_name = names[dcl.info_number].clone();
                ty.target_names = names.clone();
            }
            ty.target_name = context.shorten(&ty.target_name);
            need_cast |= info.cast && ty.cpp_name != ty.target_name;
        }

        if !value_type {
            if dcl.indirections == 0 && !dcl.reference {
                ty.annotations.push_str("@ByVal ");
            } else if dcl.indirections == 0 && dcl.reference {
                ty.annotations.push_str(if dcl.rvalue { "@ByRef(true) " } else { "@ByRef " });
            } else if dcl.indirections == 1 && dcl.reference {
                ty.annotations.push_str("@ByPtrRef ");
            } else if dcl.indirections == 2 && !dcl.reference && options.info_number >= 0 {
                ty.annotations.push_str("@ByPtrPtr ");
                need_cast |= ty.cpp_name == "void";
            } else if dcl.indirections >= 2 {
                dcl.info_number += info_length;
                need_cast = true;
                ty.target_name = "PointerPointer".to_string();
                if dcl.reference {
                    ty.annotations.push_str("@ByRef ");
                }
            }
            if !need_cast && ty.const_value && !implicit_const && !ty.target_name.contains("@Cast") {
                ty.annotations = format!("@Const {}", ty.annotations);
            }
        }
        if need_cast {
            if dcl.indirections == 0 && dcl.reference {
                cast = cast.replace("&&", "*").replace('&', "*");
            }
            if value_type && ty.const_value && dcl.reference {
                cast.pop();
            }
            if ty.const_value {
                cast = format!("const {cast}");
            }
            if !value_type && dcl.indirections == 0 && !dcl.reference {
                ty.annotations.push_str(&format!("@Cast(\"{cast}*\") "));
            } else {
                ty.annotations = format!("@Cast(\"{cast}\") {}", ty.annotations);
            }
        }

        dcl.target_name = hint.clone().unwrap_or_else(|| dcl.cpp_name.clone());
        let mut info = None;
        for name in context.qualify(&dcl.cpp_name, &self.using_list) {
            info = self.info_map.get_first_with(&name, false);
            if info.is_some() {
                dcl.cpp_name = name;
                break;
            } else if self.info_map.get_first(&name).is_some() {
                dcl.cpp_name = name;
            }
        }
        if let Some(info) = &info {
            let renamed = hint.is_none()
                && options.default_name.is_none()
                && (operator || !info.first_cpp_name().contains('<') || (context.template_map.is_some() && !in_class_template(context)));
            if let Some(name) = info.first_target_name().filter(|_| renamed) {
                dcl.target_name = name.to_string();
            }
        }

        if !dcl.cpp_name.is_empty() {
            let mut local = dcl.cpp_name.as_str();
            if let Some(i) = local.rfind("::") {
                if context.namespace.as_deref().is_some_and(|ns| ns.starts_with(&local[..i])) {
                    local = &local[i + 2..];
                }
            }
            if local != dcl.target_name {
                ty.annotations.push_str(&format!("@Name(\"{local}\") "));
            }
        }
        if let Some(info) = &info {
            ty.annotations.push_str(&info.annotation_text());
        }

        dcl.signature = dcl.target_name.clone();
        let parameters = self.parameters(context, options.info_number, options.keep_defaults)?;
        if let Some(params) = parameters {
            dcl.info_number = dcl.info_number.max(params.info_number);
            if indirections2 == 0 && !typedef {
                dcl.signature.push_str(&params.signature);
                dcl.parameters = Some(params);
            } else {
                let function_type = if typedef {
                    dcl.target_name.clone()
                } else if !params.signature.is_empty() {
                    format!("{}{}", capitalize(&dcl.target_name), params.signature)
                } else if ty.target_name != "void" {
                    format!("{}_{}", ty.target_name, capitalize(&dcl.target_name))
                } else {
                    capitalize(&dcl.target_name)
                };
                if self.get().is_keyword(Keyword::Const) {
                    definition.text.push_str("@Const ");
                }
                definition.text.push_str(&format!(
                    "public static class {function_type} extends FunctionPointer {{\n    static {{ Loader.load(); }}\n    public    {function_type}(Pointer p) {{ super(p); }}\n"
                ));
                let list = match member_of.as_ref().and_then(|i| i.first_pointer_type()) {
                    Some(owner) => {
                        let rest = &params.list[1..];
                        if rest.starts_with(')') {
                            format!("({owner} o)")
                        } else {
                            format!("({owner} o, {rest}")
                        }
                    }
                    None => {
                        definition
                            .text
                            .push_str(&format!("    protected {function_type}() {{ allocate(); }}\n    private native void allocate();\n"));
                        params.list.clone()
                    }
                };
                definition.text.push_str(&format!(
                    "    public native {}{} call{list};\n}}\n",
                    ty.annotations, ty.target_name
                ));
                definition.signature = function_type.clone();
                definition.declarator = Some(Declarator {
                    parameters: Some(params),
                    ..Declarator::default()
                });
                dcl.definition = Some(Box::new(definition));
                ty.annotations.clear();
                ty.target_name = function_type;
            }
        }

        while parens > 0 && self.get().is(")") {
            self.next();
            parens -= 1;
        }
        dcl.ty = ty;
        Ok(Some(dcl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Info;
    use crate::info_map::InfoMap;

    fn declarator(map: &mut InfoMap, text: &str, options: DeclaratorOptions<'_>) -> Declarator {
        Parser::from_text(map, text)
            .declarator(&Context::new(), options)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_by_value_class() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "Widget w;", DeclaratorOptions::default());
        assert_eq!(dcl.cpp_name, "w");
        assert_eq!(dcl.ty.annotations, "@ByVal ");
        assert_eq!(dcl.ty.target_name, "Widget");
    }

    #[test]
    fn test_pointer_to_pointer() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "float** data", DeclaratorOptions::default());
        assert_eq!(dcl.ty.annotations, "@ByPtrPtr ");
        assert_eq!(dcl.ty.target_name, "FloatPointer");

        let dcl = declarator(&mut map, "float** data", DeclaratorOptions::default().info_number(-1));
        assert_eq!(dcl.ty.target_name, "PointerPointer");
        assert_eq!(dcl.ty.annotations, "@Cast(\"float**\") ");
    }

    #[test]
    fn test_const_char_alternatives() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "const char* s", DeclaratorOptions::default());
        assert_eq!(dcl.ty.target_name, "@Cast(\"const char*\") BytePointer");
        let dcl = declarator(&mut map, "const char* s", DeclaratorOptions::default().info_number(1));
        assert_eq!(dcl.ty.target_name, "String");
        assert_eq!(dcl.info_number, 1);
    }

    #[test]
    fn test_unsigned_cast() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "unsigned int n", DeclaratorOptions::default());
        assert_eq!(dcl.ty.target_name, "int");
        assert_eq!(dcl.ty.annotations, "@Cast(\"unsigned int\") ");
    }

    #[test]
    fn test_array_dimensions() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "int table[4][8];", DeclaratorOptions::default());
        assert_eq!(dcl.dims, [4, 8]);
        assert_eq!(dcl.ty.target_name, "int");
    }

    #[test]
    fn test_second_variable_of_list() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "int *a, b;", DeclaratorOptions::default().var_number(1));
        assert_eq!(dcl.cpp_name, "b");
        assert_eq!(dcl.indirections, 0);
        let mut parser = Parser::from_text(&mut map, "int a;");
        let none = parser
            .declarator(&Context::new(), DeclaratorOptions::default().var_number(1))
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_function_pointer_definition() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "void (*callback)(int code);", DeclaratorOptions::default());
        assert_eq!(dcl.ty.target_name, "Callback_int");
        let definition = dcl.definition.unwrap();
        assert!(definition
            .text
            .starts_with("public static class Callback_int extends FunctionPointer {"));
        assert!(definition.text.contains("public native void call(int code);"));
    }

    #[test]
    fn test_vector_adapter() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "std::vector<int>& values", DeclaratorOptions::default());
        assert_eq!(dcl.ty.target_name, "IntPointer");
        assert_eq!(dcl.ty.annotations, "@StdVector ");
    }

    #[test]
    fn test_rule_renames_declarator() {
        let mut map = InfoMap::new();
        map.put(Info::new(["compute"]).target_names(["run"]));
        let dcl = declarator(&mut map, "int compute();", DeclaratorOptions::default());
        assert_eq!(dcl.target_name, "run");
        assert!(dcl.ty.annotations.contains("@Name(\"compute\")"));
        assert_eq!(dcl.signature, "run");
    }

    #[test]
    fn test_bitfield() {
        let mut map = InfoMap::new();
        let dcl = declarator(&mut map, "unsigned flags : 3;", DeclaratorOptions::default());
        assert!(dcl.bitfield);
        assert!(dcl.ty.annotations.contains("@NoOffset "));
    }
}
