//! Target language backends.
//!
//! Every backend renders the same semantic model through the shared
//! [`synthesize`](lcm_core::synthesize) traversal, so encode, decode and size
//! behave identically across languages. A backend only decides syntax and
//! where artifacts live.
//!
//! # Supported Backends
//!
//! - **Rust**: structs implementing `Marshal` and `Message` from the `lcm` runtime
//! - **Java**: classes with `DataOutput`/`DataInput` encode and decode methods
//!
//! # Architecture
//!
//! ```text
//! Schema
//!     ↓
//!  Emitter ──→ FingerprintEngine
//!     ↓
//!  ├─→ [RustBackend] → <package path>/<name>.rs + mod.rs (or lcmtypes.rs)
//!  └─→ [JavaBackend] → <package path>/<Name>.java
//! ```

pub mod java;
pub mod jvm_types;
pub mod rust;

use crate::error::EmitError;
use lcm_core::{FingerprintEngine, Schema, StructDef};
use std::path::{Path, PathBuf};

pub use java::JavaBackend;
pub use rust::RustBackend;

/// Read-only inputs shared by every artifact of one run
pub struct EmitContext<'a> {
    pub schema: &'a Schema,
    pub fingerprints: &'a FingerprintEngine<'a>,
}

impl EmitContext<'_> {
    pub fn fingerprint(&self, def: &StructDef) -> Result<u64, EmitError> {
        Ok(self.fingerprints.fingerprint(def.name())?)
    }
}

/// A generated file that is not tied to a single struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFile {
    /// Path relative to the backend's output directory
    pub path: PathBuf,
    pub contents: String,
}

/// Renders structs into one target language
pub trait Backend {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Directory all artifact paths are relative to
    fn output_directory(&self) -> &Path;

    /// Relative path of the per-struct artifact.
    ///
    /// `None` means the backend has no per-struct files and renders every
    /// struct into its index files instead.
    fn artifact_path(&self, def: &StructDef) -> Option<PathBuf>;

    /// Render the artifact for one struct
    fn render_struct(&self, def: &StructDef, ctx: &EmitContext<'_>) -> Result<String, EmitError>;

    /// Module or package files grouping the per-struct artifacts
    fn index_files(&self, ctx: &EmitContext<'_>) -> Result<Vec<IndexFile>, EmitError>;

    /// Comment line naming the generator version and every option that
    /// shapes the output. Written into each artifact's header; an artifact
    /// without the current stamp is stale.
    fn stamp(&self) -> String;
}

/// Header line marking every generated file
pub const GENERATED_HEADER: &str = "// GENERATED CODE - DO NOT EDIT";

/// Version written into artifact stamps
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header lines shared by every artifact
pub(crate) fn header(stamp: &str, source: Option<&Path>) -> String {
    let mut code = format!("{GENERATED_HEADER}\n{stamp}\n");
    if let Some(source) = source {
        code.push_str(&format!("// Source: {}\n", source.display()));
    }
    code
}

/// Append a comment block, one `prefix`ed line per comment line
pub(crate) fn push_comment(code: &mut String, indent: &str, prefix: &str, comment: Option<&str>) {
    let Some(comment) = comment else {
        return;
    };
    for line in comment.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            code.push_str(&format!("{indent}{}\n", prefix.trim_end()));
        } else {
            code.push_str(&format!("{indent}{prefix}{line}\n"));
        }
    }
}
