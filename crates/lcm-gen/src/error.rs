//! Error types for code emission

use lcm_core::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop code generation
#[derive(Error, Debug)]
pub enum EmitError {
    /// An artifact could not be read, written or its directory created
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    /// The model uses something the target language cannot express
    #[error("{backend} backend cannot emit '{item}': {reason}")]
    Unsupported {
        backend: &'static str,
        item: String,
        reason: String,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

impl EmitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmitError::Io {
            path: path.into(),
            source,
        }
    }
}
