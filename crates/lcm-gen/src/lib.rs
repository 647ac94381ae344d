//! lcm-gen - Code generator for LCM message schemas
//!
//! This crate provides:
//! - [`Backend`] implementations rendering structs as Rust ([`RustBackend`]) and
//!   Java ([`JavaBackend`]) source
//! - [`Emitter`] writing artifacts with an incremental timestamp gate
//! - [`LcmGen`] builder for `build.rs` scripts
//! - `lcm-gen.toml` configuration ([`GenConfig`]) and logging setup
//!
//! The semantic model, fingerprints and marshalling traversal come from
//! `lcm-core`; backends only contribute syntax.
//!
//! # Example
//!
//! ```no_run
//! use lcm_gen::{Emitter, RustBackend};
//! use lcm_gen::config::RustOptions;
//! use lcm_core::Schema;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::load(["types/reading.json"])?;
//! let report = Emitter::new(&schema).emit(&RustBackend::new(RustOptions::default()))?;
//! println!("wrote {} files", report.files_written());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod emit;
pub mod error;
pub mod logging;

pub use backend::{Backend, EmitContext, IndexFile, JavaBackend, RustBackend};
pub use builder::LcmGen;
pub use config::GenConfig;
pub use emit::{EmitReport, Emitter};
pub use error::EmitError;
