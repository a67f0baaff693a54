//! Preprocessor directives.

use super::{DeclaratorOptions, Parser};
use crate::ast::Declaration;
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::error::Result;
use crate::info::Info;
use crate::token::{Keyword, Token, TokenKind};
use std::sync::Arc;
use tracing::debug;

/// Target types inferred for constant macros, narrowest first, with the
/// native type recorded for them in the rule table.
const LITERAL_TYPES: [(&str, &str); 4] = [
    ("int", "int"),
    ("long", "long long"),
    ("double", "double"),
    ("String", "const char*"),
];

fn literal_rank(target: &str) -> usize {
    LITERAL_TYPES.iter().position(|(t, _)| *t == target).unwrap_or(0)
}

/// Target type of a native type recorded by an earlier constant macro.
fn literal_target(cpp: &str) -> Option<&'static str> {
    LITERAL_TYPES.iter().find(|(_, c)| *c == cpp).map(|(t, _)| *t)
}

/// Token positions of one directive: the name after the keyword, the end of
/// the line, and the end without trailing comments.
struct Span {
    begin: usize,
    end: usize,
    last: usize,
}

impl Parser<'_> {
    /// Recognizes a preprocessor line. `#define` becomes a constant, a
    /// native function, or an expansion rule; everything else is kept as a
    /// comment.
    pub(crate) fn macro_decl(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        if !self.get().is("#") {
            return Ok(false);
        }
        self.raw(|p| p.directive(context, list))
    }

    fn directive(&mut self, context: &Context, list: &mut DeclarationList) -> Result<bool> {
        let back = self.tokens.index;
        let mut spacing = self.get().spacing.to_string();
        let keyword = self.next();

        self.next();
        let begin = self.tokens.index;
        let mut token = self.get();
        while !token.is_eof() && !token.spacing.contains('\n') {
            token = self.next();
        }
        let end = self.tokens.index;
        while self.tokens.index > begin && self.get_at(-1).is_comment() {
            self.tokens.index -= 1;
        }
        let span = Span {
            begin,
            end,
            last: self.tokens.index,
        };

        let mut decl = Declaration::new();
        if keyword.is_keyword(Keyword::Define) && span.begin < span.last {
            self.define(context, back, &span, &mut decl)?;
        } else if keyword.is_keyword(Keyword::Undef) && span.begin < span.last {
            self.tokens.index = span.begin;
            let name = self.get().text.to_string();
            if self.info_map.contains_key(&name) {
                debug!(%name, "undefined");
                self.info_map.put_first(Info::new([name]));
            }
        }

        if decl.text.is_empty() {
            // keep whatever was not translated as a comment
            self.tokens.index = span.begin;
            let n = spacing.rfind('\n').map_or(0, |i| i + 1);
            decl.text = format!("// {}#{}{}", &spacing[n..], keyword.spacing, keyword.text);
            let mut token = self.get();
            while self.tokens.index < span.last && !token.is_eof() {
                if token.is_continuation() {
                    decl.text.push_str("\n// ");
                } else {
                    decl.text.push_str(&token.spacing);
                    decl.text.push_str(&token.text);
                }
                token = self.next();
            }
            spacing.truncate(n);
        }
        self.tokens.index = span.last;
        let comment = self.comment_after();
        decl.text = comment + &decl.text;
        list.spacing = Some(spacing);
        list.add(decl, self.info_map);
        list.spacing = None;
        Ok(true)
    }

    fn define(&mut self, context: &Context, back: usize, span: &Span, decl: &mut Declaration) -> Result<()> {
        self.tokens.index = span.begin;
        let name = self.get().text.to_string();
        let first = self.next();
        let has_args = first.spacing.is_empty() && first.is("(");
        let infos = self.info_map.get(&name);
        let candidates: Vec<Option<Arc<Info>>> = if infos.is_empty() {
            vec![None]
        } else {
            infos.into_iter().map(Some).collect()
        };

        for info in candidates {
            if info.as_ref().is_some_and(|i| i.skip) {
                break;
            }
            let cpp_types = info.as_ref().filter(|i| i.cpp_text.is_none()).and_then(|i| i.cpp_types.clone());
            let empty = span.begin + 1 == span.last;
            if ((has_args || empty) && info.is_none()) || cpp_types.as_ref().is_some_and(|t| t.is_empty()) {
                self.record_expansion(&name, back, span);
                break;
            } else if let (Some(info), Some(types)) = (&info, cpp_types.as_ref().filter(|t| t.len() > usize::from(!has_args))) {
                decl.text = self.macro_functions(context, &name, info, types, has_args, span)?;
            } else if info.as_ref().is_none_or(|i| i.cpp_text.is_none() && cpp_types.as_ref().is_none_or(|t| t.len() == 1)) {
                self.macro_constant(context, &name, info.as_deref(), span, decl)?;
            }
            if let Some(text) = info.as_ref().and_then(|i| i.target_text.clone()) {
                decl.text = text;
                decl.custom = true;
                break;
            }
        }
        Ok(())
    }

    /// Saves the directive as expansion text for later uses of the macro.
    fn record_expansion(&mut self, name: &str, back: usize, span: &Span) {
        let mut text = String::new();
        self.tokens.index = back;
        let mut token = self.get();
        while self.tokens.index < span.end && !token.is_eof() {
            if token.is_continuation() {
                text.push('\n');
            } else {
                text.push_str(&token.spacing);
                text.push_str(&token.text);
            }
            token = self.next();
        }
        debug!(%name, "recorded macro for expansion");
        self.info_map.put_first(Info::new([name]).cpp_text(text.trim_start()).define(true));
    }

    /// One `public static native` method per alternative target type of a
    /// macro whose signature a rule declares.
    fn macro_functions(
        &mut self,
        context: &Context,
        name: &str,
        info: &Info,
        types: &[String],
        has_args: bool,
        span: &Span,
    ) -> Result<String> {
        let target = rename(name, info);
        let mut text = String::new();
        let mut previous: Vec<String> = Vec::new();
        for info_number in -1..32isize {
            let mut params = Vec::new();
            if has_args {
                self.tokens.index = span.begin + 2;
                let mut token = self.get();
                while self.tokens.index < span.last && params.len() + 1 < types.len() && !token.is(")") {
                    if token.is_ident() {
                        params.push(format!("{} {}", types[params.len() + 1], token.text));
                    } else if token.is("...") {
                        params.push(format!("{} arg{}", types[params.len() + 1], params.len() + 1));
                    }
                    token = self.next();
                }
            }
            while params.len() + 1 < types.len() {
                params.push(format!("{} arg{}", types[params.len() + 1], params.len() + 1));
            }

            let source = format!("{} {name}({})", types[0], params.join(", "));
            let options = DeclaratorOptions::default().info_number(info_number);
            let Some(dcl) = self.fragment(&source, |p| p.declarator(context, options))? else {
                break;
            };
            let Some(parameters) = &dcl.parameters else {
                break;
            };
            if previous.contains(&dcl.signature) {
                if info_number > 0 {
                    break;
                }
            } else {
                text.push_str(&format!(
                    "public static native {}{} {target}{};\n",
                    dcl.ty.annotations, dcl.ty.target_name, parameters.list
                ));
            }
            previous.push(dcl.signature.clone());
        }
        Ok(text)
    }

    /// A `public static final` constant, or a getter when the value cannot
    /// be expressed in the target language.
    fn macro_constant(&mut self, context: &Context, name: &str, info: Option<&Info>, span: &Span, decl: &mut Declaration) -> Result<()> {
        let mut ty = "int".to_string();
        let mut concat = "";
        let mut translate = true;
        self.tokens.index = span.begin + 1;
        let mut previous = Token::new(TokenKind::Punct, "");
        let mut token = self.get();
        while self.tokens.index < span.last && !token.is_eof() {
            let inferred = match token.kind {
                TokenKind::String => Some("String"),
                TokenKind::Float => Some("double"),
                TokenKind::Integer if token.text.ends_with('L') => Some("long"),
                TokenKind::Identifier => self
                    .info_map
                    .get_first(&token.text)
                    .and_then(|i| i.first_cpp_type().and_then(literal_target)),
                _ => None,
            };
            if let Some(inferred) = inferred {
                if literal_rank(inferred) > literal_rank(&ty) {
                    ty = inferred.to_string();
                }
                if inferred == "String" {
                    concat = " + ";
                }
            } else if ((previous.is_ident() || previous.is(">")) && token.is("(")) || token.is_any(&["{", "}"]) {
                translate = false;
            }
            previous = token;
            token = self.next();
        }

        let mut target = name.to_string();
        if let Some(info) = info {
            if let Some(cpp) = info.first_cpp_type() {
                ty = match literal_target(cpp) {
                    Some(t) => t.to_string(),
                    None => {
                        let cpp = cpp.to_string();
                        let options = DeclaratorOptions::default().info_number(-1).pointer_as_array();
                        self.fragment(&cpp, |p| p.declarator(context, options))?
                            .map(|d| format!("{}{}", d.ty.annotations, d.ty.target_name))
                            .unwrap_or(ty)
                    }
                };
            }
            target = rename(name, info);
            translate = info.translate;
        }

        let mut value = String::new();
        self.tokens.index = span.begin + 1;
        if translate {
            let mut token = self.get();
            while self.tokens.index < span.last && !token.is_eof() {
                if !token.is_comment() {
                    value.push_str(&token.spacing);
                    value.push_str(&token.text);
                    if self.tokens.index + 1 < span.last {
                        value.push_str(concat);
                    }
                }
                token = self.next();
            }
            value = self.translate(&value);
        } else {
            decl.text.push_str(&format!("public static native @MemberGetter {ty} {target}();\n"));
            value = format!(" {target}()");
        }
        let short = super::last_word(&ty).to_string();
        if !value.is_empty() {
            decl.text.push_str(&format!("public static final {short} {target} ={value};\n"));
        }
        decl.signature = target;

        if info.is_none() {
            let cpp = LITERAL_TYPES[literal_rank(&short)].1;
            debug!(%name, ty = %short, "inferred macro type");
            self.info_map
                .put(Info::new([name]).cpp_types([cpp]).translate(translate).define(true));
        }
        Ok(())
    }
}

/// `@Name("cpp") target` when a rule renames the macro.
fn rename(name: &str, info: &Info) -> String {
    let Some(targets) = &info.target_names else {
        return name.to_string();
    };
    match info.cpp_names.iter().position(|n| n == name).and_then(|i| targets.get(i)) {
        Some(target) => format!("@Name(\"{}\") {target}", info.first_cpp_name()),
        None => name.to_string(),
    }
}
