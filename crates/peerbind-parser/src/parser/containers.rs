//! Peer classes for instances of standard containers named in the rule table.

use super::Parser;
use crate::ast::{Declaration, Type};
use crate::context::Context;
use crate::declaration_list::DeclarationList;
use crate::defaults::CONTAINERS;
use crate::error::Result;
use tracing::debug;

const PRIMITIVES: [&str; 8] = ["boolean", "byte", "char", "short", "int", "long", "float", "double"];

/// The interface a container family exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Random access by position: `vector`, `deque`, `valarray`.
    Indexed,
    /// Bidirectional traversal only: `list`.
    Sequence,
    /// Lookup by key: `map`, `unordered_map`.
    Keyed,
    Set,
    /// `queue` and `stack`.
    Adapter,
    Pair,
    Optional,
}

impl Shape {
    fn of(family: &str) -> Self {
        match family {
            "std::vector" | "std::deque" | "std::valarray" => Shape::Indexed,
            "std::list" => Shape::Sequence,
            "std::map" | "std::unordered_map" => Shape::Keyed,
            "std::set" | "std::unordered_set" => Shape::Set,
            "std::queue" | "std::stack" => Shape::Adapter,
            "std::pair" => Shape::Pair,
            _ => Shape::Optional,
        }
    }

    fn arity(self) -> usize {
        match self {
            Shape::Keyed | Shape::Pair => 2,
            _ => 1,
        }
    }
}

/// Annotations passing `ty` by reference unless it already says how.
fn by_ref(ty: &Type) -> String {
    if ty.annotations.is_empty() && ty.indirections == 0 {
        "@ByRef ".to_string()
    } else {
        ty.annotations.clone()
    }
}

/// A key parameter: primitives by value, objects by reference.
fn key_param(ty: &Type) -> String {
    if PRIMITIVES.contains(&ty.target_name.as_str()) {
        ty.annotations.clone()
    } else {
        by_ref(ty)
    }
}

/// `@Index ` or `@Index(n) ` for accessors taking `n` indices.
fn index_annotation(n: usize) -> String {
    match n {
        0 => String::new(),
        1 => "@Index ".to_string(),
        n => format!("@Index({n}) "),
    }
}

/// A container instance and the target types of its parts.
struct Wrapper {
    family: &'static str,
    shape: Shape,
    cpp_name: String,
    name: String,
    /// Nesting depth of the same family, as in `vector<vector<int> >`.
    dim: usize,
    index: Type,
    value: Type,
    /// Halves of a `std::pair` element.
    pair: Option<(Type, Type)>,
}

impl Wrapper {
    fn new(family: &'static str, container: Type) -> Option<Self> {
        let shape = Shape::of(family);
        let mut arguments = container.arguments?;
        if arguments.len() < shape.arity() {
            return None;
        }
        let (index, mut value) = if shape.arity() == 2 {
            let value = arguments.remove(1);
            (arguments.remove(0), value)
        } else {
            let index = Type {
                annotations: "@Cast(\"size_t\") ".to_string(),
                ..Type::named("long")
            };
            (index, arguments.remove(0))
        };
        let mut dim = 1;
        if shape == Shape::Indexed {
            while value.cpp_name.starts_with(family) {
                let Some(inner) = value.arguments.as_mut().filter(|a| !a.is_empty()) else {
                    break;
                };
                let inner = inner.remove(0);
                value = inner;
                dim += 1;
            }
        }
        let pair = match &value.arguments {
            Some(halves) if value.cpp_name.starts_with("std::pair") && halves.len() == 2 => {
                Some((halves[0].clone(), halves[1].clone()))
            }
            _ => None,
        };
        Some(Self {
            family,
            shape,
            cpp_name: container.cpp_name,
            name: container.target_name,
            dim,
            index,
            value,
            pair,
        })
    }

    /// `@Cast("size_t") long i, @Cast("size_t") long j` for `n` positions.
    fn indices(&self, n: usize) -> String {
        (0..n)
            .map(|i| {
                format!(
                    "{}{} {}",
                    key_param(&self.index),
                    self.index.target_name,
                    char::from(b'i' + i as u8)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render(&self) -> String {
        let mut text = self.header();
        match self.shape {
            Shape::Indexed => self.indexed(&mut text),
            Shape::Sequence => self.sequence(&mut text),
            Shape::Keyed => self.keyed(&mut text),
            Shape::Set => self.set(&mut text),
            Shape::Adapter => self.adapter(&mut text),
            Shape::Pair => self.pair(&mut text),
            Shape::Optional => self.optional(&mut text),
        }
        text.push_str("}\n");
        text
    }

    fn header(&self) -> String {
        let n = &self.name;
        format!(
            "\n@Name(\"{}\") public static class {n} extends Pointer {{\n    static {{ Loader.load(); }}\n    public {n}(Pointer p) {{ super(p); }}\n",
            self.cpp_name
        )
    }

    fn allocators(&self, text: &mut String, resizable: bool) {
        let n = &self.name;
        text.push_str(&format!("    public {n}()       {{ allocate();  }}\n"));
        if resizable {
            text.push_str(&format!("    public {n}(long n) {{ allocate(n); }}\n"));
        }
        text.push_str("    private native void allocate();\n");
        if resizable {
            text.push_str("    private native void allocate(@Cast(\"size_t\") long n);\n");
        }
        text.push_str(&format!("    public native @Name(\"operator=\") @ByRef {n} put(@ByRef {n} x);\n\n"));
    }

    fn indexed(&self, text: &mut String) {
        let n = &self.name;
        let v = &self.value.target_name;
        let brackets = "[]".repeat(self.dim - 1);
        let spread = self.pair.is_none();
        if spread {
            text.push_str(&format!(
                "    public {n}({v}{brackets} ... array) {{ this(array.length); put(array); }}\n"
            ));
        }
        self.allocators(text, true);
        text.push_str("    public boolean empty() { return size() == 0; }\n");
        for i in 0..self.dim {
            let annotation = index_annotation(i);
            let indices = self.indices(i);
            let separator = if i > 0 { ", " } else { "" };
            text.push_str(&format!(
                "    public native {annotation}long size({indices});\n    public native {annotation}void resize({indices}{separator}@Cast(\"size_t\") long n);\n"
            ));
        }

        let params = self.indices(self.dim);
        let annotation = index_annotation(self.dim);
        text.push('\n');
        match &self.pair {
            Some((first, second)) => {
                text.push_str(&format!(
                    "    {annotation}public native {}{} first({params}); public native {n} first({params}, {} first);\n",
                    by_ref(first),
                    first.target_name,
                    first.target_name
                ));
                text.push_str(&format!(
                    "    {annotation}public native {}{} second({params});  public native {n} second({params}, {} second);\n",
                    by_ref(second),
                    second.target_name,
                    second.target_name
                ));
            }
            None => {
                text.push_str(&format!(
                    "    {annotation}public native {}{v} get({params});\n    public native {n} put({params}, {v} value);\n",
                    by_ref(&self.value)
                ));
            }
        }

        if spread {
            text.push_str(&format!("\n    public {n} put({v}{brackets} ... array) {{\n"));
            let mut indent = "        ".to_string();
            let mut subscripts = String::new();
            let mut args = String::new();
            let mut separator = "";
            for i in 0..self.dim {
                let c = char::from(b'i' + i as u8);
                text.push_str(&format!(
                    "{indent}if (size({args}) != array{subscripts}.length) {{ resize({args}{separator}array{subscripts}.length); }}\n"
                ));
                text.push_str(&format!("{indent}for (int {c} = 0; {c} < array{subscripts}.length; {c}++) {{\n"));
                indent.push_str("    ");
                subscripts.push_str(&format!("[{c}]"));
                args.push_str(separator);
                args.push(c);
                separator = ", ";
            }
            text.push_str(&format!("{indent}put({args}{separator}array{subscripts});\n"));
            for _ in 0..self.dim {
                indent.truncate(indent.len() - 4);
                text.push_str(&format!("{indent}}}\n"));
            }
            text.push_str("        return this;\n    }\n");
        }
    }

    fn sequence(&self, text: &mut String) {
        let v = &self.value.target_name;
        let value = format!("{}{v} value", by_ref(&self.value));
        self.allocators(text, true);
        text.push_str("    public boolean empty() { return size() == 0; }\n");
        text.push_str("    public native long size();\n");
        text.push_str("    public native void resize(@Cast(\"size_t\") long n);\n\n");
        text.push_str(&format!("    public native void push_back({value});\n"));
        text.push_str(&format!("    public native void push_front({value});\n"));
        text.push_str("    public native void pop_back();\n    public native void pop_front();\n");
        text.push_str(&format!("    public native @ByVal Iterator insert(@ByVal Iterator pos, {value});\n"));
        text.push_str("    public native @ByVal Iterator erase(@ByVal Iterator pos);\n");
        self.iterator(text);
    }

    fn keyed(&self, text: &mut String) {
        let n = &self.name;
        let v = &self.value.target_name;
        let key = format!("{}{} i", key_param(&self.index), self.index.target_name);
        self.allocators(text, false);
        text.push_str("    public boolean empty() { return size() == 0; }\n");
        text.push_str("    public native long size();\n\n");
        text.push_str(&format!(
            "    @Index public native {}{v} get({key});\n    public native {n} put({key}, {v} value);\n\n",
            by_ref(&self.value)
        ));
        text.push_str("    public native void erase(@ByVal Iterator pos);\n");
        self.iterator(text);
    }

    fn set(&self, text: &mut String) {
        let v = &self.value.target_name;
        let value = format!("{}{v} value", by_ref(&self.value));
        self.allocators(text, false);
        text.push_str("    public boolean empty() { return size() == 0; }\n");
        text.push_str("    public native long size();\n\n");
        text.push_str(&format!("    public native void insert({value});\n"));
        text.push_str(&format!("    public native void erase({value});\n"));
        self.iterator(text);
    }

    fn adapter(&self, text: &mut String) {
        let v = &self.value.target_name;
        let by_ref = by_ref(&self.value);
        self.allocators(text, false);
        text.push_str("    public native boolean empty();\n");
        text.push_str("    public native long size();\n\n");
        text.push_str(&format!("    public native void push({by_ref}{v} value);\n"));
        text.push_str("    public native void pop();\n");
        if self.family == "std::stack" {
            text.push_str(&format!("    public native {by_ref}{v} top();\n"));
        } else {
            text.push_str(&format!("    public native {by_ref}{v} front();\n"));
            text.push_str(&format!("    public native {by_ref}{v} back();\n"));
        }
    }

    fn pair(&self, text: &mut String) {
        let n = &self.name;
        let (first, second) = (&self.index, &self.value);
        let (a, b) = (&first.target_name, &second.target_name);
        text.push_str(&format!("    public {n}({a} firstValue, {b} secondValue) {{ this(); put(firstValue, secondValue); }}\n"));
        self.allocators(text, false);
        text.push_str(&format!(
            "    public native {}{a} first(); public native {n} first({a} first);\n",
            by_ref(first)
        ));
        text.push_str(&format!(
            "    public native {}{b} second();  public native {n} second({b} second);\n\n",
            by_ref(second)
        ));
        text.push_str(&format!(
            "    public {n} put({a} firstValue, {b} secondValue) {{\n        first(firstValue);\n        second(secondValue);\n        return this;\n    }}\n"
        ));
    }

    fn optional(&self, text: &mut String) {
        let n = &self.name;
        let v = &self.value.target_name;
        let by_ref = by_ref(&self.value);
        text.push_str(&format!("    public {n}({v} value) {{ this(); put(value); }}\n"));
        self.allocators(text, false);
        text.push_str("    public native boolean has_value();\n");
        text.push_str(&format!("    public native @Name(\"value\") {by_ref}{v} get();\n"));
        text.push_str(&format!("    @ValueSetter public native {n} put({by_ref}{v} value);\n"));
    }

    /// `begin()`, `end()` and a nested `Iterator` peer class.
    fn iterator(&self, text: &mut String) {
        text.push_str("    public native @ByVal Iterator begin();\n    public native @ByVal Iterator end();\n");
        text.push_str("    @NoOffset @Name(\"iterator\") public static class Iterator extends Pointer {\n");
        text.push_str("        public Iterator(Pointer p) { super(p); }\n        public Iterator() { }\n\n");
        text.push_str("        public native @Name(\"operator++\") @ByRef Iterator increment();\n");
        text.push_str("        public native @Name(\"operator==\") boolean equals(@ByRef Iterator it);\n");
        if self.shape == Shape::Keyed {
            text.push_str(&format!(
                "        public native @Name(\"operator*().first\") @MemberGetter {}{} first();\n",
                key_param(&self.index),
                self.index.target_name
            ));
            text.push_str(&format!(
                "        public native @Name(\"operator*().second\") @MemberGetter {}{} second();\n",
                by_ref(&self.value),
                self.value.target_name
            ));
        } else {
            let constant = if self.shape == Shape::Set { "@Const " } else { "" };
            text.push_str(&format!(
                "        public native @Name(\"operator*\") {constant}{}{} get();\n",
                by_ref(&self.value),
                self.value.target_name
            ));
        }
        text.push_str("    }\n");
    }
}

impl Parser<'_> {
    /// Emits a peer class for every container instance that the local rule
    /// table flags `define`, such as
    /// `Info::new(["std::vector<float>"]).pointer_types(["FloatVector"]).define(true)`.
    pub fn containers(&mut self, context: &Context, list: &mut DeclarationList) -> Result<()> {
        for family in CONTAINERS {
            for info in self.info_map.get_local(family) {
                if info.skip || !info.define {
                    continue;
                }
                let cpp_name = info.first_cpp_name().to_string();
                let Some(container) = self.parse_type_fragment(&cpp_name, context)? else {
                    continue;
                };
                if container.arguments.as_ref().map_or(true, Vec::is_empty) {
                    continue;
                }
                if container.target_name.contains('<') {
                    let location = self.get().location();
                    self.warn(location, format!("No target name for container '{cpp_name}'"));
                    continue;
                }
                let Some(wrapper) = Wrapper::new(family, container.clone()) else {
                    let location = self.get().location();
                    self.warn(location, format!("Too few template arguments for container '{cpp_name}'"));
                    continue;
                };
                debug!(name = %wrapper.cpp_name, target = %wrapper.name, shape = ?wrapper.shape, "synthesized container");
                let decl = Declaration {
                    text: wrapper.render(),
                    signature: wrapper.name.clone(),
                    ty: Some(container),
                    ..Declaration::new()
                };
                list.add(decl, self.info_map);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Info;
    use crate::info_map::InfoMap;

    fn synthesize(map: &mut InfoMap) -> String {
        let mut list = DeclarationList::new();
        Parser::from_text(map, "").containers(&Context::new(), &mut list).unwrap();
        list.text()
    }

    #[test]
    fn test_vector_wrapper() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::vector<float>"]).pointer_types(["FloatVector"]).define(true));
        let text = synthesize(&mut map);
        assert!(text.starts_with("\n@Name(\"std::vector<float>\") public static class FloatVector extends Pointer {\n"));
        assert!(text.contains("    public FloatVector(float ... array) { this(array.length); put(array); }\n"));
        assert!(text.contains("    public native long size();\n"));
        assert!(text.contains("    public native void resize(@Cast(\"size_t\") long n);\n"));
        assert!(text.contains("    @Index public native @ByRef float get(@Cast(\"size_t\") long i);\n"));
        assert!(text.contains("    public native FloatVector put(@Cast(\"size_t\") long i, float value);\n"));
        assert!(text.ends_with("        return this;\n    }\n}\n"));
    }

    #[test]
    fn test_nested_vector_has_two_dimensions() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::vector<std::vector<int> >"]).pointer_types(["IntVectorVector"]).define(true));
        let text = synthesize(&mut map);
        assert!(text.contains("public IntVectorVector(int[] ... array)"));
        assert!(text.contains("    public native @Index long size(@Cast(\"size_t\") long i);\n"));
        assert!(text.contains(
            "    @Index(2) public native @ByRef int get(@Cast(\"size_t\") long i, @Cast(\"size_t\") long j);\n"
        ));
        assert!(text.contains("            for (int j = 0; j < array[i].length; j++) {\n"));
    }

    #[test]
    fn test_map_wrapper() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::map<int,double>"]).pointer_types(["IntDoubleMap"]).define(true));
        let text = synthesize(&mut map);
        assert!(text.contains("@Name(\"std::map<int,double>\") public static class IntDoubleMap extends Pointer {"));
        assert!(!text.contains("allocate(n)"));
        assert!(text.contains("    @Index public native @ByRef double get(int i);\n"));
        assert!(text.contains("    public native IntDoubleMap put(int i, double value);\n"));
        assert!(text.contains("@Name(\"operator*().first\") @MemberGetter int first();"));
        assert!(text.contains("@Name(\"operator*().second\") @MemberGetter @ByRef double second();"));
    }

    #[test]
    fn test_pair_and_optional_wrappers() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::pair<int,float>"]).pointer_types(["IntFloatPair"]).define(true));
        map.put(Info::new(["std::optional<int>"]).pointer_types(["IntOptional"]).define(true));
        let text = synthesize(&mut map);
        assert!(text.contains("    public native @ByRef int first(); public native IntFloatPair first(int first);\n"));
        assert!(text.contains("    public IntFloatPair put(int firstValue, float secondValue) {\n"));
        assert!(text.contains("    public native boolean has_value();\n"));
        assert!(text.contains("    @ValueSetter public native IntOptional put(@ByRef int value);\n"));
    }

    #[test]
    fn test_stack_and_set_wrappers() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::stack<int>"]).pointer_types(["IntStack"]).define(true));
        map.put(Info::new(["std::set<int>"]).pointer_types(["IntSet"]).define(true));
        let text = synthesize(&mut map);
        assert!(text.contains("    public native @ByRef int top();\n"));
        assert!(!text.contains("front()"));
        assert!(text.contains("    public native void insert(@ByRef int value);\n"));
        assert!(text.contains("@Name(\"operator*\") @Const @ByRef int get();"));
    }

    #[test]
    fn test_undefined_or_skipped_instances_are_ignored() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::vector<int>"]).pointer_types(["IntVector"]));
        map.put(Info::new(["std::list<int>"]).pointer_types(["IntList"]).define(true).skip(true));
        assert_eq!(synthesize(&mut map), "");
    }

    #[test]
    fn test_missing_target_name_warns() {
        let mut map = InfoMap::new();
        map.put(Info::new(["std::deque<int>"]).define(true));
        let mut list = DeclarationList::new();
        let mut parser = Parser::from_text(&mut map, "");
        parser.containers(&Context::new(), &mut list).unwrap();
        assert!(list.is_empty());
        assert_eq!(parser.warnings().len(), 1);
        assert!(parser.warnings()[0].message.contains("std::deque<int>"));
    }
}
