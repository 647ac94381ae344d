//! lcm - Runtime marshalling support for generated message types
//!
//! This crate provides:
//! - [`Marshal`] trait for the body encoding of primitives and generated structs
//! - [`Message`] trait adding the fingerprint envelope
//! - Dimension helpers ([`check_count`], [`declared_len`], [`decode_fixed`],
//!   [`decode_variable`]) called by generated array code
//! - [`CodecError`] for encode and decode failures
//!
//! # Wire Format
//!
//! ```text
//! +------------------+---------------------------+
//! | fingerprint (8B) | members in declared order |
//! |   big-endian     |   no padding, no tags     |
//! +------------------+---------------------------+
//! ```
//!
//! Integers and floats are big-endian at their natural width. Booleans are a
//! single `0`/`1` byte. Strings are an `i32` length (including a trailing NUL),
//! the UTF-8 bytes, then `0x00`.

mod codec;
mod dims;
mod message;

pub use codec::{CodecError, Marshal};
pub use dims::{Count, check_count, declared_len, decode_fixed, decode_variable};
pub use message::{FINGERPRINT_SIZE, Message};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{CodecError, Marshal, Message};
}
