//! Base hash of a struct's own member list
//!
//! This is the per-struct seed of the fingerprint. It covers member names,
//! primitive type names and dimension shapes, and nothing else: struct-typed
//! members contribute only their member name here and are folded in later by
//! the fingerprint engine.

use crate::model::Member;

const SEED: i64 = 0x1234_5678;

fn hash_update(v: i64, c: i8) -> i64 {
    ((v << 8) ^ (v >> 55)).wrapping_add(i64::from(c))
}

fn hash_string(v: i64, s: &str) -> i64 {
    // Length is folded in as a single (signed) byte
    let v = hash_update(v, s.len() as u8 as i8);
    s.bytes().fold(v, |v, b| hash_update(v, b as i8))
}

/// Compute the base hash of a member list
pub fn base_hash(members: &[Member]) -> u64 {
    let mut v = SEED;
    for member in members {
        v = hash_string(v, member.name());
        if let Some(primitive) = member.ty().primitive() {
            v = hash_string(v, primitive.name());
        }
        v = hash_update(v, member.dimensions().len() as u8 as i8);
        for dim in member.dimensions() {
            v = hash_update(v, dim.mode_index() as i8);
            v = hash_string(v, &dim.size_text());
        }
    }
    v as u64
}
