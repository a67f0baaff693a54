//! `enum` definitions, as integer constants or value-carrying enums.

use super::{capitalize, last_word, namespace_annotation, qualify_local, Parser};
use crate::ast::Declaration;
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;
use crate::info::Info;
use crate::token::{Keyword, Token};
use std::sync::Arc;
use tracing::debug;

/// Target types an underlying type may map to; anything else is `int`.
const INTEGRAL_TYPES: [&str; 4] = ["byte", "short", "int", "long"];

#[derive(Debug, Default)]
struct Enumerator {
    cpp_name: String,
    name: String,
    /// Expression the value counts up from, empty for plain numbers.
    base: String,
    count: i64,
    /// The value is only known at run time and is read through a getter.
    getter: bool,
    spacing: String,
    comment_before: String,
    comment_after: String,
}

impl Enumerator {
    fn value(&self) -> String {
        match (self.base.is_empty(), self.count) {
            (true, count) => count.to_string(),
            (false, 0) => self.base.clone(),
            (false, count) => format!("{} + {count}", self.base),
        }
    }
}

#[derive(Debug)]
enum Entry {
    Enumerator(Enumerator),
    /// Preprocessor directive found between enumerators.
    Directive(String),
}

/// The body of an enum, ready to render.
struct Enumeration {
    cpp_name: String,
    name: String,
    target_type: String,
    scoped: bool,
    entries: Vec<Entry>,
}

impl Enumeration {
    fn enumerators(&self) -> impl Iterator<Item = &Enumerator> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Enumerator(e) => Some(e),
            Entry::Directive(_) => None,
        })
    }

    /// `public static final int A = 0, B = 1;` with run-time values read
    /// through `@MemberGetter` functions.
    fn constants(&self, spacing: &str, end: &str) -> String {
        let kind = if self.scoped { "enum class" } else { "enum" };
        let indent = spacing.rfind('\n').map_or(spacing, |i| &spacing[i + 1..]);
        let mut text = format!("{spacing}/** {kind} {} */\n{indent}", self.cpp_name);
        let mut prefix = format!("public static final {}", self.target_type);
        let mut separator = "";
        let mut extra = String::new();
        for entry in &self.entries {
            let e = match entry {
                Entry::Directive(directive) => {
                    extra.push_str(directive);
                    if separator == "," && !directive.trim().starts_with("//") {
                        separator = ";";
                        prefix = format!("\npublic static final {}", self.target_type);
                    }
                    continue;
                }
                Entry::Enumerator(e) => e,
            };
            if e.getter {
                if separator == "," {
                    separator = ";";
                }
                extra = format!("\npublic static native @MemberGetter {} {}();\n", self.target_type, e.name);
                prefix = format!("public static final {}", self.target_type);
            }
            text.push_str(separator);
            text.push_str(&extra);
            text.push_str(&prefix);
            text.push_str(&e.comment_before);
            separator = ",";
            prefix.clear();
            extra.clear();

            let mut spacing = e.spacing.as_str();
            if !e.comment_after.is_empty() {
                text.push_str(spacing);
                text.push_str(e.comment_after.trim_end());
                spacing = spacing.rfind('\n').map_or(spacing, |i| &spacing[i + 1..]);
            }
            if spacing.is_empty() && !text.ends_with(',') {
                spacing = " ";
            }
            text.push_str(&format!("{spacing}{} = {}", e.name, e.value()));
        }
        text.push_str(end);
        text.push(';');
        text.push_str(&extra);
        text
    }

    /// A target `enum` whose constants carry the native value.
    fn value_enum(&self, annotation: &str) -> String {
        let name = &self.name;
        let target_type = &self.target_type;
        let kind = if self.scoped { "enum class" } else { "enum" };
        let mut text = format!("/** {kind} {} */\n{annotation}public enum {name} {{\n", self.cpp_name);
        let mut getters = String::new();
        let constants: Vec<String> = self
            .enumerators()
            .map(|e| {
                let comment = e.comment_before.trim();
                let comment = if comment.is_empty() {
                    String::new()
                } else {
                    format!("    {comment}\n")
                };
                if e.getter {
                    getters.push_str(&format!(
                        "    @Name(\"{}\") @MemberGetter public static native {target_type} {}_value();\n",
                        e.cpp_name, e.name
                    ));
                }
                format!("{comment}    {}({})", e.name, e.value())
            })
            .collect();
        text.push_str(&constants.join(",\n"));
        text.push_str(";\n\n");
        text.push_str(&getters);
        text.push_str(&format!(
            "    public final {target_type} value;\n    private {name}({target_type} v) {{ this.value = v; }}\n    private {name}({name} e) {{ this.value = e.value; }}\n    public {name} intern() {{ for ({name} e : values()) if (e.value == value) return e; return this; }}\n    @Override public String toString() {{ return intern().name(); }}\n}}"
        ));
        for entry in &self.entries {
            if let Entry::Directive(directive) = entry {
                text.push_str(directive);
            }
        }
        text
    }

    /// Rewrites references to earlier enumerators for use inside a target enum.
    fn as_enum_values(&mut self) {
        let mut seen: Vec<String> = Vec::new();
        for entry in &mut self.entries {
            let Entry::Enumerator(e) = entry else {
                continue;
            };
            if e.getter {
                e.base = format!("{}_value()", e.name);
            } else if seen.iter().any(|s| *s == e.base) && e.count == 0 {
                // a single earlier constant goes through the copy constructor
            } else if !e.base.is_empty() {
                e.base = e
                    .base
                    .split_inclusive(|c: char| !c.is_alphanumeric() && c != '_')
                    .map(|part| {
                        let word = part.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_');
                        if seen.iter().any(|s| s == word) {
                            format!("{word}.value{}", &part[word.len()..])
                        } else {
                            part.to_string()
                        }
                    })
                    .collect();
            }
            seen.push(e.name.clone());
        }
    }
}

/// Target pointer types of an integral target type.
fn pointer_types(target_type: &str) -> [String; 3] {
    let boxed = capitalize(target_type);
    [format!("{boxed}Pointer"), format!("{boxed}Buffer"), format!("{target_type}[]")]
}

impl Parser<'_> {
    /// Recognizes an `enum` definition or declaration and registers its
    /// name as an integral type.
    pub(crate) fn enumeration(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let spacing = self.get().spacing.to_string();
        let typedef = self.get().is_keyword(Keyword::Typedef);
        let mut found = false;
        let mut token = self.get();
        while !token.is_eof() {
            if token.is_keyword(Keyword::Enum) {
                found = true;
                break;
            } else if !token.is_word() {
                break;
            }
            token = self.next();
        }
        if !found {
            return Ok(false);
        }
        let scoped = self.get_at(1).is_any_keyword(&[Keyword::Class, Keyword::Struct]);
        if scoped {
            self.next();
        }
        if typedef && !self.get_at(1).is("{") && self.get_at(2).is_ident() {
            // export macro
            self.next();
        }

        let mut token = self.next();
        let mut name = String::new();
        if token.is_word() {
            name = token.text.to_string();
            token = self.next();
        }
        let mut target_type = "int".to_string();
        if token.is(":") {
            self.next();
            let Some(underlying) = self.parse_type(context)? else {
                return Ok(false);
            };
            let target = last_word(&underlying.target_name);
            if INTEGRAL_TYPES.contains(&target) {
                target_type = target.to_string();
            }
            token = self.get();
        }
        if token.is(";") && !name.is_empty() && !typedef {
            // opaque declaration
            self.next();
            let cpp_name = qualify_local(context, &name);
            self.register_enum(context, &cpp_name, &name, &target_type);
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }
        if !token.is("{") {
            return Ok(false);
        }

        let scope = if scoped {
            format!("{}::", qualify_local(context, &name))
        } else {
            context.namespace.as_ref().map(|ns| format!("{ns}::")).unwrap_or_default()
        };
        let entries = self.enumerators(context, &scope)?;

        let comment = self.comment_before();
        let mut token = self.next();
        if token.is_word() {
            name = token.text.to_string();
            token = self.next();
        }
        let end = token.expect(&[";"])?.spacing.to_string();
        self.next();
        let cpp_name = if name.is_empty() {
            String::new()
        } else {
            qualify_local(context, &name)
        };

        let info = self.info_map.get_first(&cpp_name).filter(|_| !cpp_name.is_empty());
        if info.as_ref().is_some_and(|i| i.skip) {
            list.add(Declaration::with_text(spacing), self.info_map);
            return Ok(true);
        }
        let target_name = info
            .as_ref()
            .and_then(|i| i.first_target_name())
            .map_or_else(|| name.clone(), str::to_string);
        let mut enumeration = Enumeration {
            cpp_name: cpp_name.clone(),
            name: target_name.clone(),
            target_type: target_type.clone(),
            scoped,
            entries,
        };

        let mut decl = Declaration::new();
        let enumerate = info.as_ref().is_some_and(|i| i.enumerate) && !target_name.is_empty();
        if enumerate {
            enumeration.as_enum_values();
            let annotation = if target_name != name {
                format!("@Name(\"{cpp_name}\") ")
            } else {
                namespace_annotation(context)
            };
            list.spacing = Some(spacing);
            decl.text = list.rescan(&enumeration.value_enum(&annotation));
            list.spacing = None;
        } else {
            decl.text = enumeration.constants(&spacing, &end);
        }
        decl.text.push_str(&comment);
        if !cpp_name.is_empty() {
            self.register_enum(context, &cpp_name, &target_name, &target_type);
        }
        debug!(name = %cpp_name, enumerate, count = enumeration.enumerators().count(), "parsed enum");

        if let Some(text) = info.as_ref().and_then(|i| i.target_text.clone()) {
            decl.text = text;
            decl.custom = true;
        }
        list.add(decl, self.info_map);
        Ok(true)
    }

    /// Parses enumerators up to the closing brace, leaving the cursor on it.
    fn enumerators(&mut self, context: &Context, scope: &str) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut base = String::new();
        let mut count = 0i64;
        let mut token = self.next();
        while !token.is_eof() && !token.is("}") {
            let comment_before = self.comment_before();
            let mut directives = DeclarationList::new();
            if self.attempt(|p| p.macro_decl(context, &mut directives))? {
                entries.push(Entry::Directive(comment_before + &directives.text()));
                token = self.get();
                continue;
            }

            let enumerator = self.get();
            enumerator.expect_word()?;
            let cpp_name = format!("{scope}{}", enumerator.text);
            let name = self
                .info_map
                .get_first(&cpp_name)
                .and_then(|i| i.first_target_name().map(str::to_string))
                .unwrap_or_else(|| enumerator.text.to_string());

            let mut getter = false;
            if self.next().is("=") {
                let (expr, translatable) = self.enumerator_value();
                match expr.trim().parse::<i64>() {
                    Ok(n) => {
                        count = n;
                        base.clear();
                    }
                    Err(_) if translatable => {
                        count = 0;
                        base = expr.trim().to_string();
                    }
                    Err(_) => {
                        count = 0;
                        base = format!("{name}()");
                        getter = true;
                    }
                }
            }

            let mut comment_after = self.comment_after();
            if self.get().is(",") {
                self.next();
                comment_after.push_str(&self.comment_after());
            }
            entries.push(Entry::Enumerator(Enumerator {
                cpp_name,
                name,
                base: base.clone(),
                count,
                getter,
                spacing: enumerator.spacing.to_string(),
                comment_before,
                comment_after,
            }));
            count += 1;
            token = self.get();
        }
        Ok(entries)
    }

    /// Reads an initializer up to the next `,` or `}` outside parentheses,
    /// with qualified names translated. Calls and braces cannot be
    /// translated.
    fn enumerator_value(&mut self) -> (String, bool) {
        let mut expr = String::new();
        let mut translatable = true;
        let mut depth = 0;
        let mut previous: Option<Token> = None;
        let mut qualified = String::new();
        let mut token = self.next();
        while !token.is_eof() && (depth > 0 || !token.is_any(&[",", "}"])) {
            if token.is("(") {
                depth += 1;
            } else if token.is(")") {
                depth -= 1;
            }
            let after_word = previous.as_ref().is_some_and(Token::is_word);
            if (after_word && token.is("(")) || token.is_any(&["{", "}"]) {
                translatable = false;
            }
            if token.is("::") || (token.is_word() && (qualified.is_empty() || qualified.ends_with("::"))) {
                if qualified.is_empty() {
                    qualified.push_str(&token.spacing);
                }
                qualified.push_str(&token.text);
            } else {
                expr.push_str(&self.translate(&std::mem::take(&mut qualified)));
                if token.is_word() {
                    qualified.push_str(&token.spacing);
                    qualified.push_str(&token.text);
                } else {
                    expr.push_str(&token.spacing);
                    expr.push_str(&token.text);
                }
            }
            previous = Some(token);
            token = self.next();
        }
        expr.push_str(&self.translate(&qualified));
        (expr, translatable)
    }

    /// Maps the enum type to an integral target type.
    fn register_enum(&mut self, context: &Context, cpp_name: &str, target_name: &str, target_type: &str) {
        let existing = self.info_map.get_first(cpp_name);
        let enumerate = existing.as_ref().is_some_and(|i| i.enumerate);
        let mut info = match &existing {
            Some(info) => (**info).clone(),
            None => Info::new([cpp_name]),
        };
        if info.value_types.is_none() {
            let value_type = match (&context.group, enumerate) {
                (Some(group), true) => format!("{}.{target_name}", group.target_name),
                (None, true) => target_name.to_string(),
                (_, false) => target_type.to_string(),
            };
            info.value_types = Some(vec![value_type]);
        }
        if info.pointer_types.is_none() {
            info.pointer_types = Some(pointer_types(target_type).to_vec());
        }
        info.cast = true;
        debug!(name = %cpp_name, %target_type, "registered enum");
        if existing.is_some() {
            self.info_map.put_first(Arc::new(info));
        } else {
            self.info_map.put(info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info_map::InfoMap;

    fn parse(map: &mut InfoMap, context: &Context, text: &str) -> String {
        let mut list = DeclarationList::new();
        Parser::from_text(map, text).parse(context, &mut list).unwrap();
        list.text().trim().to_string()
    }

    #[test]
    fn test_enum_constants_count_from_zero() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum Color { RED, GREEN, BLUE };");
        assert_eq!(
            text,
            "/** enum Color */\npublic static final int RED = 0, GREEN = 1, BLUE = 2;"
        );
    }

    #[test]
    fn test_enum_registers_integral_type() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum Color { RED };\nvoid paint(Color c);");
        let info = map.get_first("Color").unwrap();
        assert!(info.cast);
        assert_eq!(info.first_value_type(), Some("int"));
        assert_eq!(info.first_pointer_type(), Some("IntPointer"));
        assert!(text.ends_with("public static native void paint(@Cast(\"Color\") int c);"));
    }

    #[test]
    fn test_explicit_values_reset_counter() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum E {\n    A = 5,\n    B,\n    C = A,\n    D\n};");
        assert_eq!(
            text,
            "/** enum E */\npublic static final int\n    A = 5,\n    B = 6,\n    C = A,\n    D = A + 1;"
        );
    }

    #[test]
    fn test_untranslatable_value_uses_getter() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum Flags { NONE, ALL = compute(1) };");
        assert!(text.contains("public static final int NONE = 0;"));
        assert!(text.contains("\npublic static native @MemberGetter int ALL();\npublic static final int ALL = ALL();"));
    }

    #[test]
    fn test_qualified_value_is_translated() {
        let mut map = InfoMap::new();
        map.put(Info::new(["lib::Limits"]).pointer_types(["Limits"]));
        let text = parse(&mut map, &Context::new(), "enum E { A = lib::Limits::MAX | 1 };");
        assert!(text.contains("A = Limits.MAX | 1;"), "{text}");
    }

    #[test]
    fn test_typedef_enum_takes_trailing_name() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "typedef enum { ON, OFF } Switch;");
        assert!(text.starts_with("/** enum Switch */"));
        assert!(map.get_first("Switch").is_some());
    }

    #[test]
    fn test_scoped_enum_with_underlying_type() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum class Level : short { LOW, HIGH };");
        assert_eq!(text, "/** enum class Level */\npublic static final short LOW = 0, HIGH = 1;");
        let info = map.get_first("Level").unwrap();
        assert_eq!(info.first_value_type(), Some("short"));
        assert_eq!(info.first_pointer_type(), Some("ShortPointer"));
    }

    #[test]
    fn test_enum_in_namespace() {
        let mut map = InfoMap::new();
        let context = Context {
            namespace: Some("gfx".to_string()),
            ..Context::new()
        };
        let text = parse(&mut map, &context, "enum Mode { FILL };");
        assert!(text.starts_with("/** enum gfx::Mode */"));
        assert!(map.get_first("gfx::Mode").is_some());
    }

    #[test]
    fn test_enumerate_emits_value_enum() {
        let mut map = InfoMap::new();
        map.put(Info::new(["Color"]).enumerate(true));
        let text = parse(&mut map, &Context::new(), "enum Color { RED, GREEN = RED, BLUE = GREEN + 2 };");
        assert!(text.starts_with("/** enum Color */\npublic enum Color {\n    RED(0),\n    GREEN(RED),\n    BLUE(GREEN.value + 2);\n"));
        assert!(text.contains("    public final int value;\n"));
        assert!(text.ends_with("@Override public String toString() { return intern().name(); }\n}"));
        assert_eq!(map.get_first("Color").unwrap().first_value_type(), Some("Color"));
    }

    #[test]
    fn test_renamed_enumerator() {
        let mut map = InfoMap::new();
        map.put(Info::new(["KEY_A"]).target_names(["A"]));
        let text = parse(&mut map, &Context::new(), "enum Key { KEY_A };");
        assert!(text.contains("int A = 0;"));
    }

    #[test]
    fn test_directive_between_enumerators() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum E {\n    A,\n#if FEATURE\n    B,\n#endif\n    C\n};");
        assert!(text.contains("A = 0"), "{text}");
        assert!(text.contains("// #if FEATURE"), "{text}");
        assert!(text.contains("C = 2"), "{text}");
    }

    #[test]
    fn test_opaque_enum_declaration() {
        let mut map = InfoMap::new();
        let text = parse(&mut map, &Context::new(), "enum class Handle : long long;");
        assert_eq!(text, "");
        assert_eq!(map.get_first("Handle").unwrap().first_value_type(), Some("long"));
    }

    #[test]
    fn test_skipped_enum() {
        let mut map = InfoMap::new();
        map.put(Info::new(["Hidden"]).skip(true));
        let text = parse(&mut map, &Context::new(), "enum Hidden { X };");
        assert_eq!(text, "");
    }

    #[test]
    fn test_elaborated_type_is_not_an_enum() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "enum Color c;");
        let mut list = DeclarationList::new();
        assert!(!parser.attempt(|p| p.enumeration(&Context::new(), &mut list)).unwrap());
        assert_eq!(parser.tokens.index, 0);
    }
}
