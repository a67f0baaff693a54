//! Function parameter lists and default arguments.

use super::{DeclaratorOptions, Parser};
use crate::ast::Parameters;
use crate::context::Context;
use crate::error::Result;
use crate::token::Token;

/// A default argument expression as written.
struct DefaultValue {
    /// Expression text, first token without its spacing.
    text: String,
    /// Expression with names qualified through the rule table.
    qualified: String,
    /// The expression names something a rule skips.
    skipped: bool,
}

impl Parser<'_> {
    /// Parses `(...)` into rendered parameters.
    ///
    /// Of the parameters that carry a default value, only the first
    /// `keep_defaults` are kept; the rest are dropped, which yields the
    /// shorter overloads. Kept defaults are rendered as `/*=value*/`. When a
    /// default names something a rule skips, every parameter is kept.
    pub(crate) fn parameters(&mut self, context: &Context, info_number: isize, keep_defaults: usize) -> Result<Option<Parameters>> {
        if !self.get().is("(") {
            return Ok(None);
        }
        let back = self.tokens.index;
        let Some((mut params, skipped)) = self.parameter_list(context, info_number, keep_defaults)? else {
            self.tokens.index = back;
            return Ok(None);
        };
        if skipped {
            if keep_defaults != usize::MAX {
                self.tokens.index = back;
                if let Some((all, _)) = self.parameter_list(context, info_number, usize::MAX)? {
                    params = all;
                }
            }
            params.defaults = 0;
        }
        Ok(Some(params))
    }

    /// `None` when an entry has no type, as in the initializer of
    /// `int v(1);`, so the parentheses are not a parameter list.
    fn parameter_list(&mut self, context: &Context, info_number: isize, keep_defaults: usize) -> Result<Option<(Parameters, bool)>> {
        let mut params = Parameters {
            list: "(".to_string(),
            names: "(".to_string(),
            ..Parameters::default()
        };
        let mut count = 0usize;
        let mut kept = 0usize;
        let mut skipped_default = false;
        let mut token = self.next();
        while !token.is_eof() {
            let spacing = token.spacing.to_string();
            if token.is(")") {
                params.list.push_str(&spacing);
                params.list.push(')');
                params.names.push(')');
                self.next();
                break;
            }

            let default_name = format!("arg{count}");
            let options = DeclaratorOptions {
                default_name: Some(&default_name),
                info_number,
                ..DeclaratorOptions::default()
            };
            let dcl = self.declarator(context, options)?;
            if dcl.as_ref().is_some_and(|d| d.ty.cpp_name.is_empty()) {
                return Ok(None);
            }
            count += 1;

            let default = if self.get().is_any(&[",", ")"]) || self.get().is_eof() {
                None
            } else {
                Some(self.default_value(context))
            };
            if let Some(default) = &default {
                params.defaults += 1;
                if default.skipped {
                    skipped_default = true;
                    let message = format!("default value '{}' refers to a skipped name; keeping every argument", default.text);
                    self.warn(token.location(), message);
                }
            }
            let keep = match &default {
                Some(_) if kept < keep_defaults => {
                    kept += 1;
                    true
                }
                Some(_) => false,
                None => true,
            };

            if let Some(dcl) = dcl.filter(|_| keep) {
                if dcl.ty.target_name != "void" || dcl.indirections > 0 {
                    params.info_number = params.info_number.max(dcl.info_number);
                    let annotations = match &default {
                        Some(default) => null_value(&dcl.ty.annotations, &default.qualified),
                        None => dcl.ty.annotations.clone(),
                    };
                    if count > 1 {
                        params.list.push(',');
                    }
                    params.list.push_str(&format!("{spacing}{annotations}{} {}", dcl.ty.target_name, dcl.target_name));
                    if let Some(default) = &default {
                        params.list.push_str(&format!("/*={}*/", default.text));
                    }
                    params.signature.push('_');
                    params.signature.extend(
                        super::last_word(&dcl.ty.target_name)
                            .chars()
                            .filter(|c| c.is_alphanumeric() || *c == '_'),
                    );
                    if count > 1 {
                        params.names.push_str(", ");
                    }
                    params.names.push_str(&dcl.target_name);
                    if let Some(n) = dcl.target_name.strip_prefix("arg").and_then(|n| n.parse::<usize>().ok()) {
                        count = n + 1;
                    }
                    params.declarators.push(dcl);
                }
            }

            token = self.get();
            if token.expect(&[",", ")"])?.is(",") {
                token = self.next();
            }
        }
        Ok(Some((params, skipped_default)))
    }

    /// Consumes a default argument up to the `,` or `)` that ends it.
    fn default_value(&mut self, context: &Context) -> DefaultValue {
        let mut tokens: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        let mut token = self.next();
        while !token.is_eof() {
            if depth == 0 && token.is_any(&[",", ")"]) {
                break;
            } else if token.is_any(&["(", "{", "<", "["]) {
                depth += 1;
            } else if token.is_any(&[")", "}", ">", "]"]) {
                depth = depth.saturating_sub(1);
            }
            tokens.push(token);
            token = self.next();
        }

        let mut text = String::new();
        let mut skipped = false;
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                text.push_str(&token.spacing);
            }
            text.push_str(&token.text);
            if token.is_word() {
                skipped |= self.info_map.get_first(&token.text).is_some_and(|info| info.skip);
            }
        }
        let qualified = self.qualify_expression(context, &tokens);
        DefaultValue { text, qualified, skipped }
    }

    /// The expression with each scoped name replaced by the first
    /// qualification the rule table knows.
    fn qualify_expression(&self, context: &Context, tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if i > 0 {
                out.push_str(&token.spacing);
            }
            if !token.is_ident() {
                out.push_str(&token.text);
                i += 1;
                continue;
            }
            let mut name = token.text.to_string();
            i += 1;
            while i + 1 < tokens.len() && tokens[i].is("::") && tokens[i + 1].is_word() {
                name.push_str("::");
                name.push_str(&tokens[i + 1].text);
                i += 2;
            }
            let qualified = context
                .qualify(&name, &self.using_list)
                .into_iter()
                .find(|n| self.info_map.get_first(n).is_some())
                .unwrap_or(name);
            out.push_str(&qualified);
        }
        out
    }
}

/// Records the default value on a by-value or by-reference annotation.
fn null_value(annotations: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    for marker in ["@ByVal ", "@ByRef "] {
        if let Some(i) = annotations.find(marker) {
            let name = marker.trim_end();
            return format!(
                "{}{name}(nullValue = \"{escaped}\") {}",
                &annotations[..i],
                &annotations[i + marker.len()..]
            );
        }
    }
    annotations.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Info;
    use crate::info_map::InfoMap;

    fn parameters(map: &mut InfoMap, text: &str, keep: usize) -> Parameters {
        Parser::from_text(map, text)
            .parameters(&Context::new(), 0, keep)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_initializer_is_not_a_parameter_list() {
        let mut map = InfoMap::new();
        let mut parser = Parser::from_text(&mut map, "(1)");
        assert!(parser.parameters(&Context::new(), 0, usize::MAX).unwrap().is_none());
        assert!(parser.get().is("("));
    }

    #[test]
    fn test_plain_list() {
        let mut map = InfoMap::new();
        let params = parameters(&mut map, "(int a, float b)", usize::MAX);
        assert_eq!(params.list, "(int a, float b)");
        assert_eq!(params.names, "(a, b)");
        assert_eq!(params.signature, "_int_float");
        assert_eq!(params.declarators.len(), 2);
    }

    #[test]
    fn test_unnamed_and_void() {
        let mut map = InfoMap::new();
        assert_eq!(parameters(&mut map, "(int, int)", usize::MAX).list, "(int arg0, int arg1)");
        assert_eq!(parameters(&mut map, "(void)", usize::MAX).list, "()");
    }

    #[test]
    fn test_defaults_kept_or_dropped() {
        let mut map = InfoMap::new();
        let params = parameters(&mut map, "(int a, float b = 1.0f)", usize::MAX);
        assert_eq!(params.list, "(int a, float b/*=1.0f*/)");
        assert_eq!(params.defaults, 1);
        let params = parameters(&mut map, "(int a, float b = 1.0f)", 0);
        assert_eq!(params.list, "(int a)");
        assert_eq!(params.signature, "_int");
    }

    #[test]
    fn test_default_on_class_argument() {
        let mut map = InfoMap::new();
        map.put(Info::new(["cv::Size"]).pointer_types(["Size"]));
        let mut parser = Parser::from_text(&mut map, "(Size size = Size(3, 3))");
        let ctx = Context {
            namespace: Some("cv".to_string()),
            ..Context::new()
        };
        let params = parser.parameters(&ctx, 0, usize::MAX).unwrap().unwrap();
        assert_eq!(
            params.list,
            "(@ByVal(nullValue = \"cv::Size(3, 3)\") Size size/*=Size(3, 3)*/)"
        );
    }

    #[test]
    fn test_skipped_default_keeps_arguments() {
        let mut map = InfoMap::new();
        map.put(Info::new(["HIDDEN_DEFAULT"]).skip(true));
        let mut parser = Parser::from_text(&mut map, "(int a, int b = HIDDEN_DEFAULT)");
        let params = parser.parameters(&Context::new(), 0, 0).unwrap().unwrap();
        assert_eq!(params.declarators.len(), 2);
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn test_null_value() {
        assert_eq!(null_value("@Const @ByRef ", "\"x\""), "@Const @ByRef(nullValue = \"\\\"x\\\"\") ");
        assert_eq!(null_value("@Cast(\"int\") ", "0"), "@Cast(\"int\") ");
    }
}
