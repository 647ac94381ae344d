//! JVM type mappings for the Java backend.
//!
//! # Type Mappings
//!
//! | Schema | Java | `DataOutput` | Encoded size |
//! |--------|------|--------------|--------------|
//! | `boolean` | `boolean` | `writeByte` | 1 |
//! | `byte`, `int8_t` | `byte` | `writeByte` | 1 |
//! | `int16_t` | `short` | `writeShort` | 2 |
//! | `int32_t` | `int` | `writeInt` | 4 |
//! | `int64_t` | `long` | `writeLong` | 8 |
//! | `float` | `float` | `writeFloat` | 4 |
//! | `double` | `double` | `writeDouble` | 8 |
//! | `string` | `String` | `_encodeString` | 4 + bytes + 1 |
//!
//! Unsigned types have no JVM counterpart and are rejected.

use lcm_core::PrimitiveType;

/// A primitive as seen from Java
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JvmType {
    pub primitive: PrimitiveType,
    /// Java type name
    pub name: &'static str,
    /// `DataOutput`/`DataInput` method suffix, e.g. `Int`
    stream: &'static str,
}

impl JvmType {
    /// Statement writing `value` to `__out`
    pub fn write(&self, value: &str) -> String {
        match self.primitive {
            PrimitiveType::Boolean => format!("__out.writeByte({value} ? 1 : 0);"),
            PrimitiveType::String => format!("_encodeString(__out, {value});"),
            _ => format!("__out.write{}({value});", self.stream),
        }
    }

    /// Expression reading one value from `__in`
    pub fn read(&self) -> String {
        match self.primitive {
            PrimitiveType::Boolean => "_decodeBoolean(__in)".to_string(),
            PrimitiveType::String => "_decodeString(__in)".to_string(),
            _ => format!("__in.read{}()", self.stream),
        }
    }

    /// Encoded size, if it does not depend on the value
    pub fn fixed_size(&self) -> Option<usize> {
        self.primitive.encoded_size()
    }

    /// Expression for the encoded size of `value`
    pub fn size(&self, value: &str) -> String {
        match self.fixed_size() {
            Some(size) => size.to_string(),
            None => format!("4 + {value}.getBytes(StandardCharsets.UTF_8).length + 1"),
        }
    }

    /// Zero value used to initialise fields
    pub fn zero(&self) -> &'static str {
        match self.primitive {
            PrimitiveType::Boolean => "false",
            PrimitiveType::String => "\"\"",
            PrimitiveType::Float => "0.0f",
            PrimitiveType::Double => "0.0",
            PrimitiveType::Int64 => "0L",
            _ => "0",
        }
    }

    /// Literal for a constant of this type, as written in the schema
    pub fn literal(&self, value: &str) -> String {
        match self.primitive {
            PrimitiveType::Byte | PrimitiveType::Int8 => format!("(byte) {value}"),
            PrimitiveType::Int16 => format!("(short) {value}"),
            PrimitiveType::Int64 => format!("{value}L"),
            PrimitiveType::Float => format!("{value}f"),
            _ => value.to_string(),
        }
    }
}

/// Map a schema primitive to its Java representation
pub fn map_primitive(primitive: PrimitiveType) -> Option<JvmType> {
    let (name, stream) = match primitive {
        PrimitiveType::Boolean => ("boolean", "Byte"),
        PrimitiveType::Byte | PrimitiveType::Int8 => ("byte", "Byte"),
        PrimitiveType::Int16 => ("short", "Short"),
        PrimitiveType::Int32 => ("int", "Int"),
        PrimitiveType::Int64 => ("long", "Long"),
        PrimitiveType::Float => ("float", "Float"),
        PrimitiveType::Double => ("double", "Double"),
        PrimitiveType::String => ("String", ""),
        PrimitiveType::UInt8
        | PrimitiveType::UInt16
        | PrimitiveType::UInt32
        | PrimitiveType::UInt64 => return None,
    };
    Some(JvmType {
        primitive,
        name,
        stream,
    })
}

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while", "_",
];

/// Whether `name` is reserved in Java
pub fn is_java_keyword(name: &str) -> bool {
    JAVA_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn map_primitive___unsigned___has_no_mapping() {
        assert_eq!(map_primitive(PrimitiveType::UInt32), None);
        assert_eq!(map_primitive(PrimitiveType::UInt8), None);
    }

    #[test]
    fn jvm_type___int___uses_data_stream_methods() {
        let ty = map_primitive(PrimitiveType::Int32).unwrap();

        assert_eq!(ty.name, "int");
        assert_eq!(ty.write("this.count"), "__out.writeInt(this.count);");
        assert_eq!(ty.read(), "__in.readInt()");
        assert_eq!(ty.size("this.count"), "4");
    }

    #[test]
    fn jvm_type___boolean___is_one_byte() {
        let ty = map_primitive(PrimitiveType::Boolean).unwrap();

        assert_eq!(ty.write("this.on"), "__out.writeByte(this.on ? 1 : 0);");
        assert_eq!(ty.read(), "_decodeBoolean(__in)");
        assert_eq!(ty.fixed_size(), Some(1));
    }

    #[test]
    fn jvm_type___string___size_depends_on_value() {
        let ty = map_primitive(PrimitiveType::String).unwrap();

        assert_eq!(ty.fixed_size(), None);
        assert_eq!(
            ty.size("this.label"),
            "4 + this.label.getBytes(StandardCharsets.UTF_8).length + 1"
        );
    }

    #[test]
    fn jvm_type___literal___casts_narrow_types() {
        let byte = map_primitive(PrimitiveType::Byte).unwrap();
        let long = map_primitive(PrimitiveType::Int64).unwrap();

        assert_eq!(byte.literal("0x7f"), "(byte) 0x7f");
        assert_eq!(long.literal("-5"), "-5L");
    }

    #[test]
    fn is_java_keyword___checks_reserved_words() {
        assert!(is_java_keyword("class"));
        assert!(!is_java_keyword("count"));
    }
}
