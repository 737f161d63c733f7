use std::fmt;

/// Errors raised while decoding wire bytes or JSON into a typed value.
///
/// Mirrors the shape of a hand-rolled transport error: one variant per
/// failure class from the wire/JSON contract, no wrapped `Box<dyn Error>`.
#[derive(Debug)]
pub enum CodecError {
    /// Ran out of bytes while a tag said more should follow.
    UnexpectedEof,
    /// A tag byte (or small-int framing) outside any range this codec knows.
    UnknownTag(u8),
    /// Bytes declared as UTF-8 were not valid UTF-8.
    InvalidUtf8(std::str::Utf8Error),
    /// The 4-byte magic prefix did not match `skir` or `soia`.
    BadMagic([u8; 4]),
    /// Trailing bytes remained after a complete top-level value was read.
    TrailingBytes(usize),
    /// A JSON value had the wrong shape for the type being decoded.
    SchemaMismatch { expected: &'static str, found: String },
    /// A decoded number did not fit the target integer type.
    NumberOutOfRange(String),
    /// `serde_json` rejected the input outright (malformed JSON text).
    InvalidJson(serde_json::Error),
    /// A type descriptor's self-describing JSON form referenced a record id
    /// that was never defined in the `records` table.
    UnknownRecordId(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnexpectedEof => write!(f, "unexpected end of input"),
            CodecError::UnknownTag(b) => write!(f, "unknown wire tag byte {}", b),
            CodecError::InvalidUtf8(e) => write!(f, "invalid utf-8 in string payload: {}", e),
            CodecError::BadMagic(bytes) => {
                write!(f, "unrecognized magic prefix: {:?}", bytes)
            }
            CodecError::TrailingBytes(n) => {
                write!(f, "{} unexpected trailing byte(s) after top-level value", n)
            }
            CodecError::SchemaMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            CodecError::NumberOutOfRange(msg) => write!(f, "number out of range: {}", msg),
            CodecError::InvalidJson(e) => write!(f, "invalid json: {}", e),
            CodecError::UnknownRecordId(id) => {
                write!(f, "type descriptor referenced unknown record id {:?}", id)
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::InvalidUtf8(e) => Some(e),
            CodecError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::str::Utf8Error> for CodecError {
    fn from(e: std::str::Utf8Error) -> Self {
        CodecError::InvalidUtf8(e)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::InvalidJson(e)
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
