//! Built-in rules for fundamental types, common library types and operator names.

use crate::info::Info;
use crate::info_map::InfoMap;
use std::sync::{Arc, OnceLock};

/// Template families that can be instantiated into wrapper classes.
pub const CONTAINERS: [&str; 12] = [
    "std::deque",
    "std::list",
    "std::map",
    "std::queue",
    "std::set",
    "std::stack",
    "std::vector",
    "std::valarray",
    "std::unordered_map",
    "std::unordered_set",
    "std::pair",
    "std::optional",
];

const OPERATORS: [(&str, &str); 36] = [
    ("operator->", "access"),
    ("operator()", "apply"),
    ("operator[]", "get"),
    ("operator=", "put"),
    ("operator+", "add"),
    ("operator-", "subtract"),
    ("operator*", "multiply"),
    ("operator/", "divide"),
    ("operator%", "mod"),
    ("operator++", "increment"),
    ("operator--", "decrement"),
    ("operator==", "equals"),
    ("operator!=", "notEquals"),
    ("operator<", "lessThan"),
    ("operator>", "greaterThan"),
    ("operator<=", "lessThanEquals"),
    ("operator>=", "greaterThanEquals"),
    ("operator!", "not"),
    ("operator&&", "and"),
    ("operator||", "or"),
    ("operator&", "and"),
    ("operator|", "or"),
    ("operator^", "xor"),
    ("operator~", "not"),
    ("operator<<", "shiftLeft"),
    ("operator>>", "shiftRight"),
    ("operator+=", "addPut"),
    ("operator-=", "subtractPut"),
    ("operator*=", "multiplyPut"),
    ("operator/=", "dividePut"),
    ("operator%=", "modPut"),
    ("operator&=", "andPut"),
    ("operator|=", "orPut"),
    ("operator^=", "xorPut"),
    ("operator<<=", "shiftLeftPut"),
    ("operator>>=", "shiftRightPut"),
];

/// Names that clash with methods every peer class inherits.
const RESERVED: [&str; 6] = ["allocate", "deallocate", "address", "position", "limit", "capacity"];

/// The shared default table. Built once; every [`InfoMap::new`] layers over it.
pub fn defaults() -> Arc<InfoMap> {
    static DEFAULTS: OnceLock<Arc<InfoMap>> = OnceLock::new();
    Arc::clone(DEFAULTS.get_or_init(|| Arc::new(build())))
}

fn build() -> InfoMap {
    let mut map = InfoMap::with_parent(None);
    map.put(Info::new(["__attribute__", "__declspec"]).annotations(Vec::<String>::new()).skip(true))
        .put(Info::new(["void"]).value_types(["void"]).pointer_types(["Pointer"]))
        .put(
            Info::new([
                "va_list", "FILE", "std::exception", "std::istream", "std::ostream", "std::iostream",
                "std::ifstream", "std::ofstream", "std::fstream",
            ])
            .cast(true)
            .pointer_types(["Pointer"]),
        );

    map.put(
        Info::new(["int8_t", "__int8", "jbyte", "signed char"])
            .value_types(["byte"])
            .pointer_types(["BytePointer", "ByteBuffer", "byte[]"]),
    )
    .put(
        Info::new(["uint8_t", "unsigned __int8", "char", "unsigned char"])
            .cast(true)
            .value_types(["byte"])
            .pointer_types(["BytePointer", "ByteBuffer", "byte[]"]),
    )
    .put(
        Info::new(["int16_t", "__int16", "jshort", "short", "signed short", "short int", "signed short int"])
            .value_types(["short"])
            .pointer_types(["ShortPointer", "ShortBuffer", "short[]"]),
    )
    .put(
        Info::new(["uint16_t", "unsigned __int16", "unsigned short", "unsigned short int"])
            .cast(true)
            .value_types(["short"])
            .pointer_types(["ShortPointer", "ShortBuffer", "short[]"]),
    )
    .put(
        Info::new(["int32_t", "__int32", "jint", "int", "signed int", "signed"])
            .value_types(["int"])
            .pointer_types(["IntPointer", "IntBuffer", "int[]"]),
    )
    .put(
        Info::new(["uint32_t", "unsigned __int32", "unsigned int", "unsigned"])
            .cast(true)
            .value_types(["int"])
            .pointer_types(["IntPointer", "IntBuffer", "int[]"]),
    )
    .put(
        Info::new([
            "int64_t", "__int64", "jlong", "long long", "signed long long", "long long int",
            "signed long long int",
        ])
        .value_types(["long"])
        .pointer_types(["LongPointer", "LongBuffer", "long[]"]),
    )
    .put(
        Info::new(["uint64_t", "unsigned __int64", "unsigned long long", "unsigned long long int"])
            .cast(true)
            .value_types(["long"])
            .pointer_types(["LongPointer", "LongBuffer", "long[]"]),
    )
    .put(
        Info::new(["long", "signed long", "long int", "signed long int"])
            .value_types(["long"])
            .pointer_types(["CLongPointer"]),
    )
    .put(
        Info::new(["unsigned long", "unsigned long int"])
            .cast(true)
            .value_types(["long"])
            .pointer_types(["CLongPointer"]),
    )
    .put(
        Info::new(["size_t", "ptrdiff_t", "intptr_t", "uintptr_t", "off_t"])
            .cast(true)
            .value_types(["long"])
            .pointer_types(["SizeTPointer"]),
    )
    .put(
        Info::new(["float", "jfloat"])
            .value_types(["float"])
            .pointer_types(["FloatPointer", "FloatBuffer", "float[]"]),
    )
    .put(
        Info::new(["double", "jdouble"])
            .value_types(["double"])
            .pointer_types(["DoublePointer", "DoubleBuffer", "double[]"]),
    )
    .put(Info::new(["long double"]).cast(true).value_types(["double"]).pointer_types(["Pointer"]))
    .put(
        Info::new(["std::complex<float>"])
            .cast(true)
            .pointer_types(["FloatPointer", "FloatBuffer", "float[]"]),
    )
    .put(
        Info::new(["std::complex<double>"])
            .cast(true)
            .pointer_types(["DoublePointer", "DoubleBuffer", "double[]"]),
    )
    .put(Info::new(["bool", "jboolean"]).cast(true).value_types(["boolean"]).pointer_types(["BoolPointer"]))
    .put(Info::new(["wchar_t", "WCHAR"]).cast(true).value_types(["char"]).pointer_types(["CharPointer"]))
    .put(
        Info::new(["const char"])
            .value_types(["byte"])
            .pointer_types(["@Cast(\"const char*\") BytePointer", "String"]),
    )
    .put(Info::new(["std::string"]).annotations(["@StdString"]).value_types(["BytePointer", "String"]))
    .put(Info::new(["std::vector"]).annotations(["@StdVector"]));

    for (cpp_name, target_name) in OPERATORS {
        map.put(Info::new([cpp_name]).target_names([target_name]));
    }
    for name in RESERVED {
        map.put(Info::new([name]).target_names([format!("_{name}")]));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fundamental_types() {
        let map = defaults();
        let info = map.get_first("unsigned int").unwrap();
        assert!(info.cast);
        assert_eq!(info.first_value_type(), Some("int"));
        assert!(map.get_first("int unsigned").is_some());
        assert_eq!(map.get_first("size_t").unwrap().first_pointer_type(), Some("SizeTPointer"));
    }

    #[test]
    fn test_operator_names() {
        let map = defaults();
        assert_eq!(map.get_first("operator[]").unwrap().first_target_name(), Some("get"));
        assert_eq!(map.get_first("position").unwrap().first_target_name(), Some("_position"));
    }

    #[test]
    fn test_shared_instance() {
        assert!(Arc::ptr_eq(&defaults(), &defaults()));
        assert!(InfoMap::new().parent().is_some());
    }
}
