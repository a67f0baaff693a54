//! Parsed types, declarators and the declarations handed to the emitter.

use serde::Serialize;

/// A parsed native type reference.
///
/// `cpp_name` never keeps a leading `const`, a trailing `const`, or trailing
/// `*`/`&`: those are hoisted into the flag and count fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Type {
    pub cpp_name: String,
    pub target_name: String,
    /// Every target name the matched rule offers for this shape.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_names: Vec<String>,
    /// Target annotations, each followed by a space.
    pub annotations: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Type>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    pub indirections: u32,
    pub reference: bool,
    pub rvalue: bool,
    pub const_value: bool,
    pub const_pointer: bool,
    pub constructor: bool,
    pub destructor: bool,
    pub operator: bool,
    pub static_member: bool,
    pub simple: bool,
    pub anonymous: bool,
    pub virtual_member: bool,
    pub friend: bool,
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            target_name: name.clone(),
            cpp_name: name,
            ..Self::default()
        }
    }

    /// The native spelling with qualifiers and indirections put back.
    pub fn cpp_spelling(&self) -> String {
        let mut s = String::new();
        if self.const_value {
            s.push_str("const ");
        }
        s.push_str(&self.cpp_name);
        if self.const_pointer {
            s.push_str(" const");
        }
        for _ in 0..self.indirections {
            s.push('*');
        }
        if self.rvalue {
            s.push_str("&&");
        } else if self.reference {
            s.push('&');
        }
        s
    }

    pub fn is_pointer(&self) -> bool {
        self.indirections > 0
    }
}

/// A vendor attribute or annotation macro found next to a type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attribute {
    pub cpp_name: String,
    /// Annotation text this attribute maps to.
    pub target_name: String,
    /// Raw argument text between the parentheses, if any.
    pub arguments: String,
    /// Whether a rule declares this name as an annotation.
    pub annotation: bool,
}

/// A named instance of a [`Type`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Declarator {
    pub cpp_name: String,
    pub target_name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub indirections: u32,
    pub reference: bool,
    pub rvalue: bool,
    pub const_pointer: bool,
    /// Array dimensions, `-1` when unspecified.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dims: Vec<i64>,
    pub bitfield: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// Synthesized helper type, such as a function pointer peer class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<Box<Declaration>>,
    pub signature: String,
    /// Which of the rule's alternative target names was chosen.
    pub info_number: usize,
}

impl Declarator {
    pub fn indices(&self) -> usize {
        self.dims.len()
    }
}

/// A parenthesized argument list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameters {
    /// Rendered list, parentheses included.
    pub list: String,
    /// Bare argument names, parentheses included.
    pub names: String,
    pub declarators: Vec<Declarator>,
    pub signature: String,
    pub info_number: usize,
    /// Number of arguments carrying a default value.
    pub defaults: usize,
}

/// One emittable unit of output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Declaration {
    pub text: String,
    pub signature: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarator: Option<Declarator>,
    pub function: bool,
    pub variable: bool,
    pub comment: bool,
    pub abstract_member: bool,
    pub const_member: bool,
    /// Text came verbatim from a rule's `target_text`.
    pub custom: bool,
    pub inaccessible: bool,
    pub incomplete: bool,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            comment: true,
            ..Self::default()
        }
    }

    pub(crate) fn is_constructor(&self) -> bool {
        self.declarator.as_ref().is_some_and(|d| d.ty.constructor)
    }
}
