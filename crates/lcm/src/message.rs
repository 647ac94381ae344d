//! Fingerprint envelope for top-level messages

use crate::codec::{CodecError, Marshal};

/// Number of bytes the fingerprint occupies at the start of an envelope
pub const FINGERPRINT_SIZE: usize = std::mem::size_of::<u64>();

/// A message type that can travel on its own, prefixed by its fingerprint.
///
/// Generated structs implement this with the fingerprint computed at code
/// generation time, so a receiver rejects a mismatched schema before looking
/// at any body bytes.
pub trait Message: Marshal {
    /// Structural fingerprint of this type's schema
    const FINGERPRINT: u64;

    /// Encode the fingerprint followed by the body
    fn encode_with_fingerprint(&self) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::with_capacity(FINGERPRINT_SIZE + self.size());
        Self::FINGERPRINT.encode(&mut buffer)?;
        self.encode(&mut buffer)?;
        Ok(buffer)
    }

    /// Check the fingerprint, then decode the body
    fn decode_with_fingerprint(mut data: &[u8]) -> Result<Self, CodecError> {
        let actual = u64::decode(&mut data)?;
        if actual != Self::FINGERPRINT {
            return Err(CodecError::FingerprintMismatch {
                expected: Self::FINGERPRINT,
                actual,
            });
        }
        Self::decode(&mut data)
    }
}
