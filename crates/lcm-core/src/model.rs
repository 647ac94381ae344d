//! Semantic model: structs, members, constants and the schema that holds them
//!
//! A [`Schema`] is built once from the parser's output, validated up front and
//! immutable afterwards. Everything downstream borrows it.

use crate::error::ModelError;
use crate::hash::base_hash;
use crate::naming::is_identifier;
use crate::types::{Dimension, PrimitiveType, TypeName};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One named, typed field of a struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    name: String,
    #[serde(rename = "type")]
    ty: TypeName,
    #[serde(rename = "dims", default, skip_serializing_if = "Vec::is_empty")]
    dimensions: Vec<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeName, dimensions: Vec<Dimension>) -> Self {
        Self {
            name: name.into(),
            ty,
            dimensions,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base (element) type
    pub fn ty(&self) -> &TypeName {
        &self.ty
    }

    /// Dimensions, outermost first. Empty for scalars.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn is_scalar(&self) -> bool {
        self.dimensions.is_empty()
    }
}

/// A compile-time constant attached to a struct; never encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    name: String,
    #[serde(rename = "type")]
    ty: PrimitiveType,
    #[serde(deserialize_with = "literal")]
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl Constant {
    pub fn new(name: impl Into<String>, ty: PrimitiveType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            value: value.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> PrimitiveType {
        self.ty
    }

    /// Literal exactly as written in the schema
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    fn check(&self) -> Result<(), &'static str> {
        let value = self.value.trim();
        let parsed = match self.ty {
            PrimitiveType::Byte | PrimitiveType::UInt8 => parse_int::<u8>(value),
            PrimitiveType::Int8 => parse_int::<i8>(value),
            PrimitiveType::Int16 => parse_int::<i16>(value),
            PrimitiveType::Int32 => parse_int::<i32>(value),
            PrimitiveType::Int64 => parse_int::<i64>(value),
            PrimitiveType::UInt16 => parse_int::<u16>(value),
            PrimitiveType::UInt32 => parse_int::<u32>(value),
            PrimitiveType::UInt64 => parse_int::<u64>(value),
            PrimitiveType::Float => value.parse::<f32>().is_ok_and(f32::is_finite),
            PrimitiveType::Double => value.parse::<f64>().is_ok_and(f64::is_finite),
            PrimitiveType::Boolean | PrimitiveType::String => {
                return Err("constants must have an integer or floating-point type");
            }
        };
        if parsed {
            Ok(())
        } else {
            Err("value does not fit the declared type")
        }
    }
}

fn parse_int<T: TryFrom<i128>>(text: &str) -> bool {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.starts_with(['-', '+']) {
        return false;
    }
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => digits.parse::<i128>(),
    };
    match magnitude {
        Ok(m) => T::try_from(if negative { -m } else { m }).is_ok(),
        Err(_) => false,
    }
}

fn literal<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "constant value must be a number or string, got {other}"
        ))),
    }
}

/// A struct type: members in wire order plus constants and metadata
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StructRepr")]
pub struct StructDef {
    name: TypeName,
    members: Vec<Member>,
    constants: Vec<Constant>,
    comment: Option<String>,
    source: Option<PathBuf>,
    base_hash: u64,
}

#[derive(Deserialize)]
struct StructRepr {
    name: TypeName,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    constants: Vec<Constant>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    base_hash: Option<u64>,
}

impl From<StructRepr> for StructDef {
    fn from(repr: StructRepr) -> Self {
        let mut def = StructDef::new(repr.name, repr.members).with_constants(repr.constants);
        def.comment = repr.comment;
        def.source = repr.source;
        if let Some(hash) = repr.base_hash {
            def.base_hash = hash;
        }
        def
    }
}

impl StructDef {
    /// Create a struct, deriving its base hash from the members
    pub fn new(name: TypeName, members: Vec<Member>) -> Self {
        let base_hash = base_hash(&members);
        Self {
            name,
            members,
            constants: Vec::new(),
            comment: None,
            source: None,
            base_hash,
        }
    }

    pub fn with_constants(mut self, constants: Vec<Constant>) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Record the schema file this struct came from
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Override the derived base hash with one supplied by the parser
    pub fn with_base_hash(mut self, base_hash: u64) -> Self {
        self.base_hash = base_hash;
        self
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn base_hash(&self) -> u64 {
        self.base_hash
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    /// Distinct struct types referenced by members, in first-use order.
    ///
    /// Self-references are excluded.
    pub fn referenced_structs(&self) -> Vec<&TypeName> {
        let mut seen = Vec::new();
        for member in &self.members {
            let ty = &member.ty;
            if ty.is_primitive() || *ty == self.name || seen.contains(&ty) {
                continue;
            }
            seen.push(ty);
        }
        seen
    }
}

#[derive(Deserialize)]
struct ModelDocument {
    #[serde(default)]
    structs: Vec<StructDef>,
}

/// All structs of one compilation
#[derive(Debug, Clone)]
pub struct Schema {
    structs: Vec<StructDef>,
    index: HashMap<TypeName, usize>,
}

impl Schema {
    /// Build and validate a schema
    pub fn new(structs: Vec<StructDef>) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(structs.len());
        for (i, def) in structs.iter().enumerate() {
            if def.name.is_primitive() {
                return Err(ModelError::ReservedTypeName(def.name.full_name()));
            }
            if index.insert(def.name.clone(), i).is_some() {
                return Err(ModelError::DuplicateStruct(def.name.full_name()));
            }
        }

        let schema = Self { structs, index };
        for def in &schema.structs {
            schema.validate_struct(def)?;
        }
        schema.reject_by_value_cycles()?;

        debug!(structs = schema.structs.len(), "Validated schema");
        Ok(schema)
    }

    /// Parse a JSON model document
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_str(json)?;
        Self::new(document.structs)
    }

    /// Load and merge model files.
    ///
    /// Structs without an explicit `source` are attributed to the model file
    /// they were read from.
    pub fn load<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self, ModelError> {
        let mut structs = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let document: ModelDocument = serde_json::from_str(&json)?;
            debug!(path = %path.display(), structs = document.structs.len(), "Loaded model file");
            structs.extend(document.structs.into_iter().map(|def| {
                if def.source.is_some() {
                    def
                } else {
                    def.with_source(path)
                }
            }));
        }
        Self::new(structs)
    }

    pub fn get(&self, name: &TypeName) -> Option<&StructDef> {
        self.index.get(name).map(|&i| &self.structs[i])
    }

    /// Structs in declaration order
    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Distinct packages, sorted
    pub fn packages(&self) -> BTreeSet<&str> {
        self.structs.iter().map(|s| s.name.package()).collect()
    }

    fn validate_struct(&self, def: &StructDef) -> Result<(), ModelError> {
        let struct_name = || def.name.full_name();

        for (position, member) in def.members.iter().enumerate() {
            if !is_identifier(&member.name) {
                return Err(ModelError::InvalidIdentifier {
                    name: member.name.clone(),
                    context: format!("struct '{}'", struct_name()),
                });
            }
            if def.members[..position].iter().any(|m| m.name == member.name) {
                return Err(ModelError::DuplicateMember {
                    struct_name: struct_name(),
                    member: member.name.clone(),
                });
            }
            if !member.ty.is_primitive() && !self.index.contains_key(&member.ty) {
                return Err(ModelError::UnresolvedType {
                    struct_name: struct_name(),
                    member: member.name.clone(),
                    ty: member.ty.full_name(),
                });
            }
            for dim in &member.dimensions {
                if let Dimension::Variable { size_field } = dim {
                    self.validate_size_field(def, position, size_field)?;
                }
            }
        }

        for constant in &def.constants {
            if !is_identifier(&constant.name) {
                return Err(ModelError::InvalidIdentifier {
                    name: constant.name.clone(),
                    context: format!("constants of '{}'", struct_name()),
                });
            }
            constant
                .check()
                .map_err(|reason| ModelError::InvalidConstant {
                    struct_name: struct_name(),
                    constant: constant.name.clone(),
                    reason: format!("{reason} ({} {})", constant.ty, constant.value),
                })?;
        }
        Ok(())
    }

    fn validate_size_field(
        &self,
        def: &StructDef,
        position: usize,
        size_field: &str,
    ) -> Result<(), ModelError> {
        let member = &def.members[position];
        let invalid = |reason| ModelError::InvalidSizeField {
            struct_name: def.name.full_name(),
            member: member.name.clone(),
            field: size_field.to_string(),
            reason,
        };

        let Some(field_index) = def.member_index(size_field) else {
            return Err(ModelError::UnknownSizeField {
                struct_name: def.name.full_name(),
                member: member.name.clone(),
                field: size_field.to_string(),
            });
        };
        let field = &def.members[field_index];
        if !field.ty.primitive().is_some_and(PrimitiveType::is_integer) {
            return Err(invalid("is not integer-typed"));
        }
        if !field.is_scalar() {
            return Err(invalid("is not a scalar"));
        }
        if field_index > position {
            return Err(ModelError::SizeFieldDeclaredAfter {
                struct_name: def.name.full_name(),
                member: member.name.clone(),
                field: size_field.to_string(),
            });
        }
        Ok(())
    }

    /// A struct reachable from itself through members without any variable
    /// dimension would need infinite storage.
    fn reject_by_value_cycles(&self) -> Result<(), ModelError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(schema: &Schema, i: usize, marks: &mut [Mark]) -> Result<(), ModelError> {
            marks[i] = Mark::Active;
            let def = &schema.structs[i];
            for member in &def.members {
                if member.dimensions.iter().any(Dimension::is_variable) {
                    continue;
                }
                let Some(&next) = schema.index.get(&member.ty) else {
                    continue;
                };
                match marks[next] {
                    Mark::Active => {
                        return Err(ModelError::RecursiveByValue(
                            schema.structs[next].name.full_name(),
                        ));
                    }
                    Mark::Unvisited => visit(schema, next, marks)?,
                    Mark::Done => {}
                }
            }
            marks[i] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.structs.len()];
        for i in 0..self.structs.len() {
            if marks[i] == Mark::Unvisited {
                visit(self, i, &mut marks)?;
            }
        }
        Ok(())
    }
}
