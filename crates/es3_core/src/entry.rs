use serde::Serialize;
use serde_json::{Map, Value};

use crate::tag::ValueTag;
use crate::value::{self, ConversionError, Scalar};

static NULL: Value = Value::Null;

/// Raw shape an entry was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryForm {
    /// `{"__type": ..., "value": ...}` with an explicit type name.
    Wrapped,
    /// A bare value whose tag is inferred.
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Wrapped {
        type_name: String,
        object: Map<String, Value>,
    },
    Plain(Value),
}

/// One named value of a save document.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    key: String,
    tag: ValueTag,
    shape: Shape,
}

impl Entry {
    /// Builds an entry from a decoded value.
    ///
    /// A mapping holding a string `__type` and a `value` is wrapped and keeps its declared
    /// tag; anything else is plain and classified.
    pub fn from_raw(key: impl Into<String>, raw: Value) -> Self {
        let key = key.into();
        match raw {
            Value::Object(object) => match wrapped_type_name(&object) {
                Some(type_name) => Self {
                    key,
                    tag: ValueTag::from_type_name(&type_name),
                    shape: Shape::Wrapped { type_name, object },
                },
                None => Self {
                    key,
                    tag: ValueTag::Opaque,
                    shape: Shape::Plain(Value::Object(object)),
                },
            },
            other => Self {
                key,
                tag: value::classify(&other),
                shape: Shape::Plain(other),
            },
        }
    }

    /// Creates a wrapped entry using the canonical type name of the scalar's tag.
    pub fn wrapped_scalar(key: impl Into<String>, scalar: &Scalar) -> Self {
        let tag = scalar.tag();
        let type_name = tag.canonical_type_name().unwrap_or(tag.as_str()).to_string();
        let mut object = Map::new();
        object.insert(
            ValueTag::TYPE_FIELD.to_string(),
            Value::String(type_name.clone()),
        );
        object.insert(ValueTag::VALUE_FIELD.to_string(), scalar.to_value());
        Self {
            key: key.into(),
            tag,
            shape: Shape::Wrapped { type_name, object },
        }
    }

    pub fn to_raw(&self) -> Value {
        match &self.shape {
            Shape::Wrapped { object, .. } => Value::Object(object.clone()),
            Shape::Plain(value) => value.clone(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tag(&self) -> ValueTag {
        self.tag
    }

    pub fn form(&self) -> EntryForm {
        match self.shape {
            Shape::Wrapped { .. } => EntryForm::Wrapped,
            Shape::Plain(_) => EntryForm::Plain,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match &self.shape {
            Shape::Wrapped { type_name, .. } => Some(type_name),
            Shape::Plain(_) => None,
        }
    }

    /// The leaf value: the `value` field of a wrapped entry, or the bare value.
    pub fn value(&self) -> &Value {
        match &self.shape {
            Shape::Wrapped { object, .. } => object.get(ValueTag::VALUE_FIELD).unwrap_or(&NULL),
            Shape::Plain(value) => value,
        }
    }

    pub fn display_text(&self) -> Option<String> {
        if !self.tag.is_scalar() {
            return None;
        }
        value::display_text(self.value())
    }

    /// Reads the value as a scalar of this entry's tag.
    pub fn scalar(&self) -> Result<Scalar, ConversionError> {
        Scalar::from_value(self.value(), self.tag)
    }

    pub fn set_text(&mut self, text: &str) -> Result<(), ConversionError> {
        let value = value::parse_text(text, self.tag)?;
        self.replace_value(value);
        Ok(())
    }

    pub fn set_bool(&mut self, flag: bool) -> Result<(), ConversionError> {
        if self.tag != ValueTag::Boolean {
            return Err(ConversionError::TagMismatch {
                expected: self.tag,
                found: ValueTag::Boolean,
            });
        }
        self.replace_value(Value::Bool(flag));
        Ok(())
    }

    pub fn set_scalar(&mut self, scalar: &Scalar) -> Result<(), ConversionError> {
        scalar.validate()?;
        if scalar.tag() != self.tag {
            return Err(ConversionError::TagMismatch {
                expected: self.tag,
                found: scalar.tag(),
            });
        }
        self.replace_value(scalar.to_value());
        Ok(())
    }

    /// The nested mapping behind an opaque entry, if its value is a mapping.
    pub fn nested(&self) -> Option<&Map<String, Value>> {
        self.value().as_object()
    }

    pub(crate) fn set_nested(&mut self, inner: Map<String, Value>) {
        self.replace_value(Value::Object(inner));
    }

    fn replace_value(&mut self, value: Value) {
        match &mut self.shape {
            Shape::Wrapped { object, .. } => {
                object.insert(ValueTag::VALUE_FIELD.to_string(), value);
            }
            Shape::Plain(current) => {
                self.tag = value::classify(&value);
                *current = value;
            }
        }
    }
}

fn wrapped_type_name(object: &Map<String, Value>) -> Option<String> {
    if !object.contains_key(ValueTag::VALUE_FIELD) {
        return None;
    }
    object
        .get(ValueTag::TYPE_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
}
