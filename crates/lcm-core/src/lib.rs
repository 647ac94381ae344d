//! lcm-core - Language-agnostic core of the LCM schema compiler
//!
//! This crate provides:
//! - [`naming`] identifier transforms shared by every backend
//! - [`Schema`], [`StructDef`], [`Member`], [`Dimension`] and friends: the
//!   semantic model handed over by the schema parser
//! - [`FingerprintEngine`] for cycle-safe structural fingerprints
//! - [`MarshalPlan`] and [`synthesize`], the dimension-aware traversal that
//!   backends render into encode, decode and size routines
//! - [`DynamicCodec`] which interprets a plan directly over [`Value`] trees
//!
//! # Pipeline
//!
//! ```text
//! parser output (JSON)
//!     ↓
//!  Schema (validated, immutable)
//!     ↓
//!  ├─→ FingerprintEngine → u64 per struct
//!  └─→ MarshalPlan → synthesize(Phase, &mut impl MarshalRenderer) → backend text
//! ```

mod error;
mod hash;
mod model;
mod types;

pub mod dynamic;
pub mod fingerprint;
pub mod marshal;
pub mod naming;

pub use dynamic::{DynamicCodec, DynamicError, StructValue, Value};
pub use error::ModelError;
pub use fingerprint::{FingerprintEngine, RecursionGuard, publish};
pub use hash::base_hash;
pub use marshal::{Axis, Leaf, MarshalPlan, MarshalRenderer, MemberPlan, Phase, synthesize};
pub use model::{Constant, Member, Schema, StructDef};
pub use types::{Dimension, PrimitiveType, TypeName};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Dimension, FingerprintEngine, MarshalPlan, Member, ModelError, PrimitiveType, Schema,
        StructDef, TypeName,
    };
}
