use serde::Serialize;
use thiserror::Error;

use crate::codec::CodecError;
use crate::tag::ValueTag;
use crate::value::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoreErrorCode {
    Io,
    NotFound,
    Sequence,
    Codec,
    Conversion,
    UnsupportedOperation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Conversion failure for one key or field, naming the tag it was converted under.
    pub fn conversion(subject: &str, expected: ValueTag, source: ConversionError) -> Self {
        Self::new(
            CoreErrorCode::Conversion,
            format!("{subject} ({expected}): {source}"),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::NotFound, message)
    }

    pub fn sequence(message: impl Into<String>) -> Self {
        Self::new(CoreErrorCode::Sequence, message)
    }
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        Self::new(CoreErrorCode::Codec, err.message())
    }
}
