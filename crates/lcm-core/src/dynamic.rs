//! Schema-driven codec over untyped values
//!
//! [`DynamicCodec`] interprets marshal plans at runtime instead of going
//! through generated code. Tools that inspect traffic for arbitrary schemas
//! use it, and it serves as the reference the generated code is checked
//! against: both follow the same declared-count, ordering and size rules.

use crate::error::ModelError;
use crate::fingerprint::FingerprintEngine;
use crate::marshal::{Leaf, MarshalPlan, MemberPlan};
use crate::model::Schema;
use crate::types::{Dimension, PrimitiveType, TypeName};
use lcm::{CodecError, FINGERPRINT_SIZE, Marshal};
use std::collections::HashMap;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors from the dynamic codec
#[derive(Error, Debug)]
pub enum DynamicError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("field '{field}' expected a value of type {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("struct '{struct_name}' value is missing field '{field}'")]
    MissingField { struct_name: String, field: String },

    /// Struct values nested deeper than the codec's limit
    #[error("struct nesting exceeds the limit of {limit} levels while decoding '{struct_name}'")]
    NestingTooDeep { struct_name: String, limit: usize },
}

/// Default limit on nested struct values while decoding
pub const MAX_DECODE_DEPTH: usize = 64;

/// An untyped value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Struct(StructValue),
}

impl Value {
    /// The value as an element count source, if it is an integer
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Byte(v) | Value::UInt8(v) => Some(v.into()),
            Value::Int8(v) => Some(v.into()),
            Value::Int16(v) => Some(v.into()),
            Value::Int32(v) => Some(v.into()),
            Value::Int64(v) => Some(v.into()),
            Value::UInt16(v) => Some(v.into()),
            Value::UInt32(v) => Some(v.into()),
            Value::UInt64(v) => Some(v.into()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(value) => Some(value),
            _ => None,
        }
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

/// Field values of one struct instance, in wire order once decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructValue {
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`StructValue::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Encodes, decodes and sizes [`StructValue`]s for any struct in a schema
pub struct DynamicCodec<'a> {
    plans: HashMap<&'a TypeName, MarshalPlan<'a>>,
    fingerprints: FingerprintEngine<'a>,
    max_depth: usize,
}

impl<'a> DynamicCodec<'a> {
    pub fn new(schema: &'a Schema) -> Result<Self, ModelError> {
        let plans = schema
            .structs()
            .iter()
            .map(|def| Ok((def.name(), MarshalPlan::new(def, schema)?)))
            .collect::<Result<HashMap<_, _>, ModelError>>()?;
        Ok(Self {
            plans,
            fingerprints: FingerprintEngine::new(schema),
            max_depth: MAX_DECODE_DEPTH,
        })
    }

    /// Limit how deeply struct values may nest in decoded input.
    ///
    /// The top-level struct is level one.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Published fingerprint of a struct
    pub fn fingerprint(&self, ty: &TypeName) -> Result<u64, ModelError> {
        self.fingerprints.fingerprint(ty)
    }

    /// Encode the body of `value` as struct `ty`
    pub fn encode(
        &self,
        ty: &TypeName,
        value: &StructValue,
        writer: &mut dyn Write,
    ) -> Result<(), DynamicError> {
        self.encode_struct(self.plan(ty)?, value, writer)
    }

    /// Decode a body of struct `ty`
    pub fn decode(&self, ty: &TypeName, reader: &mut dyn Read) -> Result<StructValue, DynamicError> {
        self.decode_struct(self.plan(ty)?, 1, reader)
    }

    /// Exact number of bytes [`DynamicCodec::encode`] writes for `value`
    pub fn size(&self, ty: &TypeName, value: &StructValue) -> Result<usize, DynamicError> {
        self.size_struct(self.plan(ty)?, value)
    }

    /// Encode the fingerprint envelope followed by the body
    pub fn encode_message(&self, ty: &TypeName, value: &StructValue) -> Result<Vec<u8>, DynamicError> {
        let mut buffer = Vec::with_capacity(FINGERPRINT_SIZE + self.size(ty, value)?);
        self.fingerprint(ty)?.encode(&mut buffer)?;
        self.encode(ty, value, &mut buffer)?;
        Ok(buffer)
    }

    /// Check the fingerprint envelope, then decode the body
    pub fn decode_message(&self, ty: &TypeName, mut data: &[u8]) -> Result<StructValue, DynamicError> {
        let expected = self.fingerprint(ty)?;
        let actual = u64::decode(&mut data)?;
        if actual != expected {
            return Err(CodecError::FingerprintMismatch { expected, actual }.into());
        }
        self.decode(ty, &mut data)
    }

    fn plan(&self, ty: &TypeName) -> Result<&MarshalPlan<'a>, ModelError> {
        self.plans
            .get(ty)
            .ok_or_else(|| ModelError::UnknownStruct(ty.full_name()))
    }

    fn field<'v>(plan: &MarshalPlan<'_>, value: &'v StructValue, name: &str) -> Result<&'v Value, DynamicError> {
        value.get(name).ok_or_else(|| DynamicError::MissingField {
            struct_name: plan.struct_def().name().full_name(),
            field: name.to_string(),
        })
    }

    fn count(owner: &StructValue, size_field: &str) -> Result<i128, DynamicError> {
        owner
            .get(size_field)
            .and_then(Value::as_integer)
            .ok_or_else(|| DynamicError::TypeMismatch {
                field: size_field.to_string(),
                expected: "integer".to_string(),
            })
    }

    // Encoding

    fn encode_struct(
        &self,
        plan: &MarshalPlan<'_>,
        value: &StructValue,
        writer: &mut dyn Write,
    ) -> Result<(), DynamicError> {
        for member in plan.members() {
            let field = Self::field(plan, value, member.name())?;
            self.encode_axes(member, value, 0, field, writer)?;
        }
        Ok(())
    }

    fn encode_axes(
        &self,
        member: &MemberPlan<'_>,
        owner: &StructValue,
        depth: usize,
        value: &Value,
        writer: &mut dyn Write,
    ) -> Result<(), DynamicError> {
        let Some(dimension) = member.dimensions().get(depth) else {
            return self.encode_leaf(member, value, writer);
        };
        let items = value.as_array().ok_or_else(|| array_expected(member))?;

        let len = match dimension {
            Dimension::Constant { size } => {
                if items.len() != *size {
                    return Err(CodecError::ArrayLength {
                        expected: *size,
                        actual: items.len(),
                    }
                    .into());
                }
                *size
            }
            Dimension::Variable { size_field } => {
                lcm::check_count(member.name(), Self::count(owner, size_field)?, items.len())?
            }
        };
        for item in &items[..len] {
            self.encode_axes(member, owner, depth + 1, item, writer)?;
        }
        Ok(())
    }

    fn encode_leaf(
        &self,
        member: &MemberPlan<'_>,
        value: &Value,
        writer: &mut dyn Write,
    ) -> Result<(), DynamicError> {
        let primitive = match member.leaf() {
            Leaf::Struct(ty) => {
                let nested = value.as_struct().ok_or_else(|| mismatch(member, &ty.full_name()))?;
                return self.encode_struct(self.plan(ty)?, nested, writer);
            }
            Leaf::Primitive(primitive) => primitive,
        };
        match (primitive, value) {
            (PrimitiveType::Boolean, Value::Bool(v)) => v.encode(writer)?,
            (PrimitiveType::Byte, Value::Byte(v)) | (PrimitiveType::UInt8, Value::UInt8(v)) => {
                v.encode(writer)?
            }
            (PrimitiveType::Int8, Value::Int8(v)) => v.encode(writer)?,
            (PrimitiveType::Int16, Value::Int16(v)) => v.encode(writer)?,
            (PrimitiveType::Int32, Value::Int32(v)) => v.encode(writer)?,
            (PrimitiveType::Int64, Value::Int64(v)) => v.encode(writer)?,
            (PrimitiveType::UInt16, Value::UInt16(v)) => v.encode(writer)?,
            (PrimitiveType::UInt32, Value::UInt32(v)) => v.encode(writer)?,
            (PrimitiveType::UInt64, Value::UInt64(v)) => v.encode(writer)?,
            (PrimitiveType::Float, Value::Float(v)) => v.encode(writer)?,
            (PrimitiveType::Double, Value::Double(v)) => v.encode(writer)?,
            (PrimitiveType::String, Value::String(v)) => v.encode(writer)?,
            _ => return Err(mismatch(member, primitive.name())),
        }
        Ok(())
    }

    // Decoding

    /// `level` counts enclosing struct values, this one included
    fn decode_struct(
        &self,
        plan: &MarshalPlan<'_>,
        level: usize,
        reader: &mut dyn Read,
    ) -> Result<StructValue, DynamicError> {
        if level > self.max_depth {
            return Err(DynamicError::NestingTooDeep {
                struct_name: plan.struct_def().name().full_name(),
                limit: self.max_depth,
            });
        }
        let mut value = StructValue {
            fields: Vec::with_capacity(plan.members().len()),
        };
        for member in plan.members() {
            let field = self.decode_axes(member, &value, 0, level, reader)?;
            value.fields.push((member.name().to_string(), field));
        }
        Ok(value)
    }

    /// Size fields are read from `partial`, which holds every member decoded
    /// so far; plans guarantee they precede the members they size.
    fn decode_axes(
        &self,
        member: &MemberPlan<'_>,
        partial: &StructValue,
        depth: usize,
        level: usize,
        reader: &mut dyn Read,
    ) -> Result<Value, DynamicError> {
        let Some(dimension) = member.dimensions().get(depth) else {
            return self.decode_leaf(member, level, reader);
        };
        let decode = |r: &mut dyn Read| self.decode_axes(member, partial, depth + 1, level, r);

        let items = match dimension {
            Dimension::Constant { size } => {
                let mut items = Vec::with_capacity(*size);
                for _ in 0..*size {
                    items.push(decode(&mut *reader)?);
                }
                items
            }
            Dimension::Variable { size_field } => {
                let count = Self::count(partial, size_field)?;
                lcm::decode_variable(member.name(), count, reader, decode)?
            }
        };
        Ok(Value::Array(items))
    }

    fn decode_leaf(
        &self,
        member: &MemberPlan<'_>,
        level: usize,
        reader: &mut dyn Read,
    ) -> Result<Value, DynamicError> {
        let primitive = match member.leaf() {
            Leaf::Struct(ty) => {
                let nested = self.decode_struct(self.plan(ty)?, level + 1, reader)?;
                return Ok(Value::Struct(nested));
            }
            Leaf::Primitive(primitive) => primitive,
        };
        let value = match primitive {
            PrimitiveType::Boolean => Value::Bool(bool::decode(reader)?),
            PrimitiveType::Byte => Value::Byte(u8::decode(reader)?),
            PrimitiveType::Int8 => Value::Int8(i8::decode(reader)?),
            PrimitiveType::Int16 => Value::Int16(i16::decode(reader)?),
            PrimitiveType::Int32 => Value::Int32(i32::decode(reader)?),
            PrimitiveType::Int64 => Value::Int64(i64::decode(reader)?),
            PrimitiveType::UInt8 => Value::UInt8(u8::decode(reader)?),
            PrimitiveType::UInt16 => Value::UInt16(u16::decode(reader)?),
            PrimitiveType::UInt32 => Value::UInt32(u32::decode(reader)?),
            PrimitiveType::UInt64 => Value::UInt64(u64::decode(reader)?),
            PrimitiveType::Float => Value::Float(f32::decode(reader)?),
            PrimitiveType::Double => Value::Double(f64::decode(reader)?),
            PrimitiveType::String => Value::String(String::decode(reader)?),
        };
        Ok(value)
    }

    // Sizing

    fn size_struct(&self, plan: &MarshalPlan<'_>, value: &StructValue) -> Result<usize, DynamicError> {
        let mut size = 0;
        for member in plan.members() {
            let field = Self::field(plan, value, member.name())?;
            size += self.size_axes(member, value, 0, field)?;
        }
        Ok(size)
    }

    fn size_axes(
        &self,
        member: &MemberPlan<'_>,
        owner: &StructValue,
        depth: usize,
        value: &Value,
    ) -> Result<usize, DynamicError> {
        let Some(dimension) = member.dimensions().get(depth) else {
            return self.size_leaf(member, value);
        };
        let items = value.as_array().ok_or_else(|| array_expected(member))?;
        let len = match dimension {
            Dimension::Constant { size } => (*size).min(items.len()),
            Dimension::Variable { size_field } => {
                lcm::declared_len(Self::count(owner, size_field)?).min(items.len())
            }
        };
        items[..len]
            .iter()
            .map(|item| self.size_axes(member, owner, depth + 1, item))
            .sum()
    }

    fn size_leaf(&self, member: &MemberPlan<'_>, value: &Value) -> Result<usize, DynamicError> {
        match (member.leaf(), value) {
            (Leaf::Struct(ty), Value::Struct(nested)) => self.size_struct(self.plan(ty)?, nested),
            (Leaf::Struct(ty), _) => Err(mismatch(member, &ty.full_name())),
            (Leaf::Primitive(PrimitiveType::String), Value::String(s)) => Ok(s.size()),
            (Leaf::Primitive(primitive), _) => primitive
                .encoded_size()
                .ok_or_else(|| mismatch(member, primitive.name())),
        }
    }
}

fn mismatch(member: &MemberPlan<'_>, expected: &str) -> DynamicError {
    DynamicError::TypeMismatch {
        field: member.name().to_string(),
        expected: expected.to_string(),
    }
}

fn array_expected(member: &MemberPlan<'_>) -> DynamicError {
    mismatch(member, "array")
}

#[cfg(test)]
#[path = "dynamic/dynamic_tests.rs"]
mod dynamic_tests;
