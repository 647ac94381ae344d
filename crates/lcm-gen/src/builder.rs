//! Builder for running the generator from `build.rs`.
//!
//! ```no_run
//! use lcm_gen::LcmGen;
//! use lcm_gen::config::{RustLayout, RustOptions};
//!
//! # fn main() -> Result<(), lcm_gen::EmitError> {
//! let out_dir = std::env::var("OUT_DIR").unwrap_or_default();
//! LcmGen::new()
//!     .add_directory("types")?
//!     .rust_options(RustOptions {
//!         output: out_dir.into(),
//!         layout: RustLayout::Single,
//!         module_root: "crate".to_string(),
//!         ..RustOptions::default()
//!     })
//!     .cargo_messages(true)
//!     .run()?;
//! # Ok(())
//! # }
//! ```

use crate::backend::{JavaBackend, RustBackend};
use crate::config::{GenConfig, JavaOptions, RustOptions};
use crate::emit::{EmitReport, Emitter};
use crate::error::EmitError;
use lcm_core::Schema;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Model file extension picked up by [`LcmGen::add_directory`]
pub const MODEL_EXTENSION: &str = "json";

/// Collects model files and backend settings, then generates in one call
#[derive(Debug, Clone)]
pub struct LcmGen {
    models: Vec<PathBuf>,
    rust: Option<RustOptions>,
    java: Option<JavaOptions>,
    incremental: bool,
    cargo_messages: bool,
}

impl Default for LcmGen {
    fn default() -> Self {
        Self::new()
    }
}

impl LcmGen {
    /// Rust output with default options, incremental, no cargo messages
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            rust: Some(RustOptions::default()),
            java: None,
            incremental: true,
            cargo_messages: false,
        }
    }

    /// Start from a loaded config file; backends are chosen separately
    pub fn from_config(config: &GenConfig) -> Self {
        Self {
            models: Vec::new(),
            rust: Some(config.rust.clone()),
            java: None,
            incremental: config.incremental,
            cargo_messages: config.cargo_messages,
        }
    }

    pub fn add_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.models.push(path.into());
        self
    }

    /// Add every `*.json` file below `dir`, in sorted order
    pub fn add_directory(mut self, dir: impl AsRef<Path>) -> Result<Self, EmitError> {
        let found = find_models(dir.as_ref())?;
        debug!(dir = %dir.as_ref().display(), models = found.len(), "Scanned model directory");
        self.models.extend(found);
        Ok(self)
    }

    /// Output directory of the Rust backend
    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rust.get_or_insert_with(RustOptions::default).output = dir.into();
        self
    }

    pub fn rust_options(mut self, options: RustOptions) -> Self {
        self.rust = Some(options);
        self
    }

    /// Turn the Rust backend off
    pub fn without_rust(mut self) -> Self {
        self.rust = None;
        self
    }

    pub fn java(mut self, options: JavaOptions) -> Self {
        self.java = Some(options);
        self
    }

    pub fn incremental(mut self, enabled: bool) -> Self {
        self.incremental = enabled;
        self
    }

    /// Print `cargo:rerun-if-changed` for every model file
    pub fn cargo_messages(mut self, enabled: bool) -> Self {
        self.cargo_messages = enabled;
        self
    }

    /// Load the models and run every enabled backend
    pub fn run(&self) -> Result<EmitReport, EmitError> {
        if self.cargo_messages {
            for model in &self.models {
                println!("cargo:rerun-if-changed={}", model.display());
            }
        }

        let schema = Schema::load(&self.models)?;
        debug!(structs = schema.len(), "Schema loaded");
        let emitter = Emitter::new(&schema).incremental(self.incremental);

        let mut report = EmitReport::default();
        if let Some(options) = &self.rust {
            report.merge(emitter.emit(&RustBackend::new(options.clone()))?);
        }
        if let Some(options) = &self.java {
            report.merge(emitter.emit(&JavaBackend::new(options.clone()))?);
        }
        Ok(report)
    }
}

/// Recursively find model files below `dir`
pub fn find_models(dir: &Path) -> Result<Vec<PathBuf>, EmitError> {
    let mut models = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|e| EmitError::io(&current, e))?;
        for entry in entries {
            let path = entry.map_err(|e| EmitError::io(&current, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == MODEL_EXTENSION) {
                models.push(path);
            }
        }
    }

    models.sort();
    Ok(models)
}
