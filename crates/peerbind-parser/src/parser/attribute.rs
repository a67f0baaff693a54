//! Vendor attributes, annotation macros and skipped bodies.

use super::Parser;
use crate::ast::Attribute;
use crate::error::Result;

impl Parser<'_> {
    /// Consumes a word and its parenthesized arguments, if any.
    ///
    /// The word counts as an annotation when its rule carries annotations
    /// and no type mapping. Arguments of skipped attributes are dropped.
    pub(crate) fn attribute(&mut self) -> Result<Option<Attribute>> {
        let token = self.get();
        if !token.is_word() {
            return Ok(None);
        }
        let mut attr = Attribute {
            cpp_name: token.text.to_string(),
            ..Attribute::default()
        };
        let info = self.info_map.get_first(&attr.cpp_name);
        if let Some(info) = &info {
            attr.annotation = info.annotations.is_some()
                && info.target_names.is_none()
                && info.value_types.is_none()
                && info.pointer_types.is_none();
            if attr.annotation {
                attr.target_name = info.annotation_text();
            }
        }

        if !self.next().is("(") {
            return Ok(Some(attr));
        }
        let skip = info.is_some_and(|i| i.skip);
        self.raw(|p| {
            let mut count = 1;
            let mut token = p.next();
            while !token.is_eof() && count > 0 {
                if token.is("(") {
                    count += 1;
                } else if token.is(")") {
                    count -= 1;
                } else if !skip {
                    attr.arguments.push_str(&token.spacing);
                    attr.arguments.push_str(&token.text);
                }
                token = p.next();
            }
        });
        attr.arguments = attr.arguments.trim().to_string();
        Ok(Some(attr))
    }

    /// Consumes a `[[...]]` attribute list. It never maps to anything.
    pub(crate) fn bracket_attribute(&mut self) -> Attribute {
        let mut attr = Attribute {
            annotation: true,
            ..Attribute::default()
        };
        self.next();
        let mut token = self.next();
        while !token.is_eof() {
            if token.is("]") && self.get_at(1).is("]") {
                self.next();
                self.next();
                break;
            }
            attr.cpp_name.push_str(&token.text);
            token = self.next();
        }
        attr
    }

    /// Skips a balanced `{...}` block. Returns false when not at `{`.
    pub(crate) fn body(&mut self) -> bool {
        if !self.get().is("{") {
            return false;
        }
        self.raw(|p| {
            let mut count = 1;
            let mut token = p.next();
            while !token.is_eof() && count > 0 {
                if token.is("{") {
                    count += 1;
                } else if token.is("}") {
                    count -= 1;
                }
                token = p.next();
            }
        });
        true
    }
}
