use serde_json::{Map, Value};

use crate::entry::Entry;
use crate::tag::ValueTag;
use crate::value::{self, ConversionError};

/// Flat key/text editor over the nested mapping of an opaque entry.
///
/// Works on a copy; nothing reaches the document until the editor is applied with
/// [`crate::core_api::Document::apply_nested`]. Keys that are not touched keep their
/// exact original values, nested structures included.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedEditor {
    key: String,
    inner: Map<String, Value>,
}

impl NestedEditor {
    pub fn open(entry: &Entry) -> Result<Self, ConversionError> {
        let inner = entry
            .nested()
            .cloned()
            .ok_or(ConversionError::NotEditableAsText { tag: entry.tag() })?;
        Ok(Self {
            key: entry.key().to_string(),
            inner,
        })
    }

    /// Key of the top-level entry being edited.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `(key, text)` pairs in order; text is `None` for non-scalar values.
    pub fn rows(&self) -> Vec<(String, Option<String>)> {
        self.inner
            .iter()
            .map(|(k, v)| (k.clone(), value::display_text(v)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sets `key` from text. Existing keys keep their kind; new keys are inferred as
    /// integer, float, then text.
    pub fn set(&mut self, key: &str, text: &str) -> Result<(), ConversionError> {
        match self.inner.get_mut(key) {
            Some(existing) => {
                *existing = value::parse_text(text, value::classify(existing))?;
            }
            None => {
                self.inner.insert(key.to_string(), value::infer_text(text));
            }
        }
        Ok(())
    }

    pub fn set_bool(&mut self, key: &str, flag: bool) -> Result<(), ConversionError> {
        match self.inner.get_mut(key) {
            Some(existing) if existing.is_boolean() => *existing = Value::Bool(flag),
            Some(other) => {
                return Err(ConversionError::TagMismatch {
                    expected: value::classify(other),
                    found: ValueTag::Boolean,
                });
            }
            None => {
                self.inner.insert(key.to_string(), Value::Bool(flag));
            }
        }
        Ok(())
    }

    /// Removes `key`, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> bool {
        self.inner.shift_remove(key).is_some()
    }

    /// Renames `from` to `to` in place. Returns false if `from` is absent or `to` is
    /// already used by another key.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if !self.inner.contains_key(from) || (from != to && self.inner.contains_key(to)) {
            return false;
        }
        let previous = std::mem::take(&mut self.inner);
        for (k, v) in previous {
            if k == from {
                self.inner.insert(to.to_string(), v);
            } else {
                self.inner.insert(k, v);
            }
        }
        true
    }

    pub(crate) fn into_parts(self) -> (String, Map<String, Value>) {
        (self.key, self.inner)
    }
}
