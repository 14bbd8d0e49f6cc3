use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of an entry's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueTag {
    Boolean,
    Integer,
    Float,
    Text,
    Opaque,
}

const BOOLEAN_TYPE_NAMES: [&str; 2] = ["bool", "System.Boolean"];
const INTEGER_TYPE_NAMES: [&str; 16] = [
    "int",
    "uint",
    "long",
    "ulong",
    "short",
    "ushort",
    "byte",
    "sbyte",
    "System.Int32",
    "System.UInt32",
    "System.Int64",
    "System.UInt64",
    "System.Int16",
    "System.UInt16",
    "System.Byte",
    "System.SByte",
];
const FLOAT_TYPE_NAMES: [&str; 6] = [
    "float",
    "double",
    "decimal",
    "System.Single",
    "System.Double",
    "System.Decimal",
];
const TEXT_TYPE_NAMES: [&str; 4] = ["string", "char", "System.String", "System.Char"];

impl ValueTag {
    pub const TYPE_FIELD: &'static str = "__type";
    pub const VALUE_FIELD: &'static str = "value";

    /// Maps a declared ES3 type name onto a tag. Unknown names are opaque.
    pub fn from_type_name(name: &str) -> Self {
        if BOOLEAN_TYPE_NAMES.contains(&name) {
            Self::Boolean
        } else if INTEGER_TYPE_NAMES.contains(&name) {
            Self::Integer
        } else if FLOAT_TYPE_NAMES.contains(&name) {
            Self::Float
        } else if TEXT_TYPE_NAMES.contains(&name) {
            Self::Text
        } else {
            Self::Opaque
        }
    }

    /// Type name written when a wrapped entry is created from scratch.
    pub fn canonical_type_name(&self) -> Option<&'static str> {
        match *self {
            Self::Boolean => Some("bool"),
            Self::Integer => Some("int"),
            Self::Float => Some("float"),
            Self::Text => Some("string"),
            Self::Opaque => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Opaque)
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Boolean => "bool",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Text => "string",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
