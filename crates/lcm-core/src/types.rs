//! Type names, primitive types and array dimensions

use crate::error::ModelError;
use crate::naming::is_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in wire types
///
/// The canonical name of each primitive is the spelling that enters the base
/// hash, so it must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    String,
}

impl PrimitiveType {
    /// Parse a primitive type name, accepting both `int32` and `int32_t`
    pub fn parse(name: &str) -> Option<Self> {
        let primitive = match name {
            "boolean" | "bool" => PrimitiveType::Boolean,
            "byte" => PrimitiveType::Byte,
            "int8_t" | "int8" => PrimitiveType::Int8,
            "int16_t" | "int16" => PrimitiveType::Int16,
            "int32_t" | "int32" => PrimitiveType::Int32,
            "int64_t" | "int64" => PrimitiveType::Int64,
            "uint8_t" | "uint8" => PrimitiveType::UInt8,
            "uint16_t" | "uint16" => PrimitiveType::UInt16,
            "uint32_t" | "uint32" => PrimitiveType::UInt32,
            "uint64_t" | "uint64" => PrimitiveType::UInt64,
            "float" | "float32" => PrimitiveType::Float,
            "double" | "float64" => PrimitiveType::Double,
            "string" => PrimitiveType::String,
            _ => return None,
        };
        Some(primitive)
    }

    /// Canonical schema spelling
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Int8 => "int8_t",
            PrimitiveType::Int16 => "int16_t",
            PrimitiveType::Int32 => "int32_t",
            PrimitiveType::Int64 => "int64_t",
            PrimitiveType::UInt8 => "uint8_t",
            PrimitiveType::UInt16 => "uint16_t",
            PrimitiveType::UInt32 => "uint32_t",
            PrimitiveType::UInt64 => "uint64_t",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::String => "string",
        }
    }

    /// Whether values of this type can size a variable dimension
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte
                | PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::UInt8
                | PrimitiveType::UInt16
                | PrimitiveType::UInt32
                | PrimitiveType::UInt64
        )
    }

    /// Encoded width in bytes, or `None` for variable-length strings
    pub fn encoded_size(self) -> Option<usize> {
        match self {
            PrimitiveType::Boolean
            | PrimitiveType::Byte
            | PrimitiveType::Int8
            | PrimitiveType::UInt8 => Some(1),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float => Some(4),
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Double => Some(8),
            PrimitiveType::String => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for PrimitiveType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PrimitiveType::parse(&value).ok_or(ModelError::UnknownPrimitive(value))
    }
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.name().to_string()
    }
}

/// A fully qualified type reference
///
/// Primitive types have an empty package and their canonical name as the
/// short name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName {
    package: String,
    short_name: String,
}

impl TypeName {
    /// Build a type name from its parts, validating each identifier
    pub fn new(package: impl Into<String>, short_name: impl Into<String>) -> Result<Self, ModelError> {
        let package = package.into();
        let short_name = short_name.into();

        let valid_package = package.is_empty() || package.split('.').all(is_identifier);
        if !valid_package || !is_identifier(&short_name) {
            let full = if package.is_empty() {
                short_name
            } else {
                format!("{package}.{short_name}")
            };
            return Err(ModelError::InvalidTypeName(full));
        }

        Ok(Self {
            package,
            short_name,
        })
    }

    /// Parse a dotted name such as `robot.sensors.pose_t`, splitting at the last dot
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        if let Some(primitive) = PrimitiveType::parse(name) {
            return Ok(Self::primitive_type(primitive));
        }
        match name.rsplit_once('.') {
            Some((package, short_name)) => Self::new(package, short_name),
            None => Self::new("", name),
        }
    }

    /// Type name of a primitive
    pub fn primitive_type(primitive: PrimitiveType) -> Self {
        Self {
            package: String::new(),
            short_name: primitive.name().to_string(),
        }
    }

    /// Dot-separated namespace, possibly empty
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.short_name.clone()
        } else {
            format!("{}.{}", self.package, self.short_name)
        }
    }

    /// The primitive this name denotes, if any
    pub fn primitive(&self) -> Option<PrimitiveType> {
        if self.package.is_empty() {
            PrimitiveType::parse(&self.short_name)
        } else {
            None
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive().is_some()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.short_name)
        } else {
            write!(f, "{}.{}", self.package, self.short_name)
        }
    }
}

impl TryFrom<String> for TypeName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeName::parse(&value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.full_name()
    }
}

/// One axis of an array member
///
/// In the JSON model a number is a constant axis and a string names the
/// sibling size field of a variable axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    Constant { size: usize },
    Variable { size_field: String },
}

impl Dimension {
    pub fn constant(size: usize) -> Self {
        Dimension::Constant { size }
    }

    pub fn variable(size_field: impl Into<String>) -> Self {
        Dimension::Variable {
            size_field: size_field.into(),
        }
    }

    /// The size as written in the schema: the literal or the field name
    pub fn size_text(&self) -> String {
        match self {
            Dimension::Constant { size } => size.to_string(),
            Dimension::Variable { size_field } => size_field.clone(),
        }
    }

    /// Hashed mode tag: 0 for constant, 1 for variable
    pub fn mode_index(&self) -> u8 {
        match self {
            Dimension::Constant { .. } => 0,
            Dimension::Variable { .. } => 1,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Dimension::Variable { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Constant(usize),
    Named(String),
}

impl From<DimensionRepr> for Dimension {
    fn from(value: DimensionRepr) -> Self {
        match value {
            DimensionRepr::Constant(size) => Dimension::Constant { size },
            // Parsers sometimes hand literal sizes over as text
            DimensionRepr::Named(text) => match text.parse::<usize>() {
                Ok(size) => Dimension::Constant { size },
                Err(_) => Dimension::Variable { size_field: text },
            },
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(value: Dimension) -> Self {
        match value {
            Dimension::Constant { size } => DimensionRepr::Constant(size),
            Dimension::Variable { size_field } => DimensionRepr::Named(size_field),
        }
    }
}
