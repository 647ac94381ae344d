//! Marshal trait and primitive encodings

use std::io::{Read, Write};
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A variable dimension promises more elements than its container holds
    #[error("declared count {declared} for '{field}' exceeds the {available} elements available")]
    DeclaredCountExceedsLength {
        field: String,
        declared: i128,
        available: usize,
    },

    /// A size field holds a value that cannot be an element count
    #[error("invalid element count {value} for '{field}'")]
    InvalidCount { field: String, value: i128 },

    #[error("booleans must be encoded as 0 or 1, got {0}")]
    InvalidBool(u8),

    #[error("invalid string length prefix: {0}")]
    InvalidStringLength(i32),

    #[error("expected NUL terminator after string")]
    MissingNulTerminator,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("string of {0} bytes is too long to encode")]
    StringTooLong(usize),

    #[error("fingerprint mismatch: expected {expected:#018x}, got {actual:#018x}")]
    FingerprintMismatch { expected: u64, actual: u64 },

    #[error("fixed array expected {expected} elements, got {actual}")]
    ArrayLength { expected: usize, actual: usize },
}

impl CodecError {
    /// Whether this error was raised while encoding (as opposed to decoding)
    pub fn is_encode_error(&self) -> bool {
        matches!(
            self,
            CodecError::DeclaredCountExceedsLength { .. } | CodecError::StringTooLong(_)
        )
    }
}

/// Body encoding shared by primitives and generated message structs
///
/// Generated code calls these methods for every leaf element, so the encoding
/// of a struct is the concatenation of its members' encodings in declared order.
pub trait Marshal: Sized {
    /// Encode this value into the writer
    fn encode(&self, writer: &mut dyn Write) -> Result<(), CodecError>;

    /// Decode a value from the reader
    fn decode(reader: &mut dyn Read) -> Result<Self, CodecError>;

    /// Exact number of bytes [`Marshal::encode`] writes for this value
    fn size(&self) -> usize;
}

macro_rules! impl_marshal_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Marshal for $ty {
                #[inline]
                fn encode(&self, writer: &mut dyn Write) -> Result<(), CodecError> {
                    writer.write_all(&self.to_be_bytes())?;
                    Ok(())
                }

                #[inline]
                fn decode(reader: &mut dyn Read) -> Result<Self, CodecError> {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    reader.read_exact(&mut bytes)?;
                    Ok(<$ty>::from_be_bytes(bytes))
                }

                #[inline]
                fn size(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }
            }
        )*
    };
}

impl_marshal_numeric!(u8, i8, i16, i32, i64, u16, u32, u64, f32, f64);

impl Marshal for bool {
    fn encode(&self, writer: &mut dyn Write) -> Result<(), CodecError> {
        u8::from(*self).encode(writer)
    }

    fn decode(reader: &mut dyn Read) -> Result<Self, CodecError> {
        match u8::decode(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    fn size(&self) -> usize {
        1
    }
}

impl Marshal for String {
    fn encode(&self, writer: &mut dyn Write) -> Result<(), CodecError> {
        let len =
            i32::try_from(self.len() + 1).map_err(|_| CodecError::StringTooLong(self.len()))?;
        len.encode(writer)?;
        writer.write_all(self.as_bytes())?;
        writer.write_all(&[0])?;
        Ok(())
    }

    fn decode(reader: &mut dyn Read) -> Result<Self, CodecError> {
        let len = i32::decode(reader)?;
        if len < 1 {
            return Err(CodecError::InvalidStringLength(len));
        }
        let expected = (len - 1) as usize;

        // read_to_end on a Take grows with the data actually present, so a
        // bogus length prefix cannot force a huge allocation up front
        let mut bytes = Vec::new();
        Read::take(&mut *reader, expected as u64).read_to_end(&mut bytes)?;
        if bytes.len() != expected {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }

        if u8::decode(reader)? != 0 {
            return Err(CodecError::MissingNulTerminator);
        }

        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }

    fn size(&self) -> usize {
        std::mem::size_of::<i32>() + self.len() + 1
    }
}
