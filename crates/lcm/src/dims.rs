//! Array dimension helpers called by generated code
//!
//! A member with dimensions is encoded by descending its axes outermost first.
//! Constant axes always carry exactly their literal length. Variable axes carry
//! the current value of a sibling integer field, which must not exceed the
//! length of the in-memory container; extra trailing elements are not encoded.

use crate::codec::CodecError;
use std::io::Read;

/// Upper bound on elements reserved ahead of decoding a variable axis.
///
/// The declared count comes from untrusted input, so the vector grows with
/// the elements actually decoded beyond this point.
const MAX_PREALLOCATED_ELEMENTS: usize = 4096;

/// Integer types usable as the size field of a variable dimension
pub trait Count: Copy {
    /// The count as a `usize`, or `None` if negative or unrepresentable
    fn to_count(self) -> Option<usize>;

    /// The raw value, for error reporting
    fn raw(self) -> i128;
}

macro_rules! impl_count {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Count for $ty {
                #[inline]
                fn to_count(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn raw(self) -> i128 {
                    i128::from(self)
                }
            }
        )*
    };
}

impl_count!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

/// Check a variable dimension before encoding it.
///
/// Returns the number of elements to encode, which is the declared count.
pub fn check_count(
    field: &str,
    declared: impl Count,
    available: usize,
) -> Result<usize, CodecError> {
    let count = declared.to_count().ok_or_else(|| CodecError::InvalidCount {
        field: field.to_string(),
        value: declared.raw(),
    })?;
    if count > available {
        return Err(CodecError::DeclaredCountExceedsLength {
            field: field.to_string(),
            declared: declared.raw(),
            available,
        });
    }
    Ok(count)
}

/// Number of elements a variable dimension contributes to the encoded size.
///
/// Negative counts contribute nothing; encoding such a value fails anyway.
#[inline]
pub fn declared_len(declared: impl Count) -> usize {
    declared.to_count().unwrap_or(0)
}

/// Decode a constant dimension of exactly `N` elements
pub fn decode_fixed<T, E, const N: usize>(
    reader: &mut dyn Read,
    mut decode: impl FnMut(&mut dyn Read) -> Result<T, E>,
) -> Result<[T; N], E>
where
    E: From<CodecError>,
{
    let mut items = Vec::with_capacity(N);
    for _ in 0..N {
        items.push(decode(&mut *reader)?);
    }
    items.try_into().map_err(|items: Vec<T>| {
        CodecError::ArrayLength {
            expected: N,
            actual: items.len(),
        }
        .into()
    })
}

/// Decode a variable dimension whose length is an already decoded size field
///
/// The element decoder may use any error type a [`CodecError`] converts into.
pub fn decode_variable<T, E>(
    field: &str,
    declared: impl Count,
    reader: &mut dyn Read,
    mut decode: impl FnMut(&mut dyn Read) -> Result<T, E>,
) -> Result<Vec<T>, E>
where
    E: From<CodecError>,
{
    let count = declared.to_count().ok_or_else(|| CodecError::InvalidCount {
        field: field.to_string(),
        value: declared.raw(),
    })?;
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATED_ELEMENTS));
    for _ in 0..count {
        items.push(decode(&mut *reader)?);
    }
    Ok(items)
}

#[cfg(test)]
#[path = "dims/dims_tests.rs"]
mod dims_tests;
