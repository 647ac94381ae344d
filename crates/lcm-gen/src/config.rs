//! `lcm-gen.toml` configuration

use crate::error::EmitError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "lcm-gen.toml";

/// lcm-gen.toml structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Default log filter when `LCM_GEN_LOG` is unset
    pub log_level: String,

    /// Skip artifacts that are newer than their schema source
    pub incremental: bool,

    /// Print `cargo:rerun-if-changed` lines for every model file
    pub cargo_messages: bool,

    pub rust: RustOptions,

    pub java: JavaOptions,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            incremental: true,
            cargo_messages: false,
            rust: RustOptions::default(),
            java: JavaOptions::default(),
        }
    }
}

/// How Rust artifacts are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RustLayout {
    /// One file per struct plus a `mod.rs` per package level
    #[default]
    Tree,
    /// A single `lcmtypes.rs` with inline modules, for `include!`
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RustOptions {
    pub output: PathBuf,

    /// Module path the generated tree is mounted at, used for struct references
    pub module_root: String,

    pub layout: RustLayout,

    /// Crate providing `Marshal` and `Message`
    pub runtime_crate: String,
}

impl Default for RustOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("src/lcmtypes"),
            module_root: "crate::lcmtypes".to_string(),
            layout: RustLayout::Tree,
            runtime_crate: "lcm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaOptions {
    pub output: PathBuf,
}

impl Default for JavaOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("java"),
        }
    }
}

impl GenConfig {
    /// Load config from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EmitError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EmitError::io(path, e))?;
        Self::parse(&content).map_err(|source| EmitError::Config {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Parse config from a string
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `path` if given, else `lcm-gen.toml` in `dir` if present, else defaults
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, EmitError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let candidate = dir.join(CONFIG_FILE);
                if candidate.is_file() {
                    Self::from_file(candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
