//! Value classification and text conversion.
//!
//! Every place that needs to know what kind of value an entry holds goes through
//! [`classify`]; every edit that arrives as text goes through [`parse_text`].

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::tag::ValueTag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("'{text}' is not an integer")]
    NotAnInteger { text: String },
    #[error("'{text}' is not a number")]
    NotANumber { text: String },
    #[error("booleans are set with a toggle, not parsed from '{text}'")]
    BooleanFromText { text: String },
    #[error("{tag} values cannot be edited as text")]
    NotEditableAsText { tag: ValueTag },
    #[error("expected {expected}, found {found}")]
    TagMismatch { expected: ValueTag, found: ValueTag },
}

/// Infers the tag of a raw decoded value.
///
/// Booleans are matched before numbers so they are never reported as integers, and
/// integral numbers before floats. Mappings, arrays and nulls are opaque.
pub fn classify(value: &Value) -> ValueTag {
    match value {
        Value::Bool(_) => ValueTag::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => ValueTag::Integer,
        Value::Number(_) => ValueTag::Float,
        Value::String(_) => ValueTag::Text,
        _ => ValueTag::Opaque,
    }
}

/// Converts edited text back into a raw value of the given tag.
pub fn parse_text(text: &str, tag: ValueTag) -> Result<Value, ConversionError> {
    match tag {
        ValueTag::Integer => parse_integer(text),
        ValueTag::Float => parse_float(text),
        ValueTag::Text => Ok(Value::String(text.to_string())),
        ValueTag::Boolean => Err(ConversionError::BooleanFromText {
            text: text.to_string(),
        }),
        ValueTag::Opaque => Err(ConversionError::NotEditableAsText { tag }),
    }
}

/// Converts text for a key with no established tag: integer, then float, then text.
pub fn infer_text(text: &str) -> Value {
    parse_integer(text)
        .or_else(|_| parse_float(text))
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Editable text for a scalar value, `None` for opaque values.
pub fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn parse_integer(text: &str) -> Result<Value, ConversionError> {
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(Value::from(v));
    }
    if let Ok(v) = trimmed.parse::<u64>() {
        return Ok(Value::from(v));
    }
    Err(ConversionError::NotAnInteger {
        text: text.to_string(),
    })
}

fn parse_float(text: &str) -> Result<Value, ConversionError> {
    trimmed_f64(text)
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ConversionError::NotANumber {
            text: text.to_string(),
        })
}

fn trimmed_f64(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// A leaf value with a native Rust type, as held by structured view fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn tag(&self) -> ValueTag {
        match self {
            Self::Boolean(_) => ValueTag::Boolean,
            Self::Integer(_) => ValueTag::Integer,
            Self::Float(_) => ValueTag::Float,
            Self::Text(_) => ValueTag::Text,
        }
    }

    /// Extracts a scalar from a raw value, checking it against `expected`.
    ///
    /// Float accepts any JSON number; the remaining tags require an exact kind.
    pub fn from_value(value: &Value, expected: ValueTag) -> Result<Self, ConversionError> {
        match (expected, value) {
            (ValueTag::Boolean, Value::Bool(b)) => Ok(Self::Boolean(*b)),
            (ValueTag::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => n
                .as_i64()
                .map(Self::Integer)
                .ok_or_else(|| ConversionError::NotAnInteger {
                    text: n.to_string(),
                }),
            (ValueTag::Float, Value::Number(n)) => {
                n.as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| ConversionError::NotANumber {
                        text: n.to_string(),
                    })
            }
            (ValueTag::Text, Value::String(s)) => Ok(Self::Text(s.clone())),
            _ => Err(ConversionError::TagMismatch {
                expected,
                found: classify(value),
            }),
        }
    }

    /// Parses edited text under `tag`.
    pub fn parse(text: &str, tag: ValueTag) -> Result<Self, ConversionError> {
        let value = parse_text(text, tag)?;
        Self::from_value(&value, tag)
    }

    /// Rejects values that have no raw representation (non-finite floats).
    pub fn validate(&self) -> Result<(), ConversionError> {
        match self {
            Self::Float(v) if !v.is_finite() => Err(ConversionError::NotANumber {
                text: v.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(v) => Value::from(*v),
            Self::Float(v) => Value::from(*v),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            other => write!(f, "{}", other.to_value()),
        }
    }
}
