//! Error types for the semantic model

use std::path::PathBuf;
use thiserror::Error;

/// Error raised when a semantic model is inconsistent.
///
/// The upstream parser is expected to rule these out; when one shows up here
/// the compiler stops instead of emitting artifacts for a broken model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid type name '{0}'")]
    InvalidTypeName(String),

    #[error("unknown primitive type '{0}'")]
    UnknownPrimitive(String),

    #[error("invalid identifier '{name}' in {context}")]
    InvalidIdentifier { name: String, context: String },

    #[error("struct '{0}' is defined more than once")]
    DuplicateStruct(String),

    #[error("type name '{0}' is reserved for a primitive type")]
    ReservedTypeName(String),

    #[error("struct '{struct_name}' declares '{member}' more than once")]
    DuplicateMember { struct_name: String, member: String },

    #[error("member '{member}' of '{struct_name}' references unknown type '{ty}'")]
    UnresolvedType {
        struct_name: String,
        member: String,
        ty: String,
    },

    #[error("unknown struct '{0}'")]
    UnknownStruct(String),

    #[error("member '{member}' of '{struct_name}' is sized by unknown field '{field}'")]
    UnknownSizeField {
        struct_name: String,
        member: String,
        field: String,
    },

    #[error("member '{member}' of '{struct_name}' is sized by '{field}', which {reason}")]
    InvalidSizeField {
        struct_name: String,
        member: String,
        field: String,
        reason: &'static str,
    },

    #[error("member '{member}' of '{struct_name}' is sized by '{field}', which is declared after it")]
    SizeFieldDeclaredAfter {
        struct_name: String,
        member: String,
        field: String,
    },

    #[error("constant '{constant}' of '{struct_name}' is invalid: {reason}")]
    InvalidConstant {
        struct_name: String,
        constant: String,
        reason: String,
    },

    #[error("struct '{0}' contains itself by value and has no finite encoding")]
    RecursiveByValue(String),

    #[error("failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model: {0}")]
    Json(#[from] serde_json::Error),
}
