//! Structured views: named domain fields projected out of a raw document.
//!
//! Each field is backed by exactly one raw key and is either present or missing. A
//! missing field is never written back; a present field only overwrites its own key.

use serde::Serialize;

use crate::core_api::{CoreError, EditReport, RawDocument};
use crate::entry::Entry;
use crate::tag::ValueTag;
use crate::value::{ConversionError, Scalar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Presence<T> {
    Present(T),
    Missing,
}

impl<T> Presence<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_ref(&self) -> Presence<&T> {
        match self {
            Self::Present(v) => Presence::Present(v),
            Self::Missing => Presence::Missing,
        }
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Presence<U> {
        match self {
            Self::Present(v) => Presence::Present(f(v)),
            Self::Missing => Presence::Missing,
        }
    }
}

impl<T> From<Option<T>> for Presence<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Missing,
        }
    }
}

/// Static description of a domain field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub key: &'static str,
    pub tag: ValueTag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewField {
    pub spec: FieldSpec,
    pub value: Presence<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredView {
    plugin: &'static str,
    fields: Vec<ViewField>,
}

impl StructuredView {
    /// Reads every field from `raw`. Absent keys become missing fields; present keys
    /// must hold a value of the field's tag.
    pub fn parse(
        plugin: &'static str,
        specs: &[FieldSpec],
        raw: &RawDocument,
    ) -> Result<Self, CoreError> {
        let mut fields = Vec::with_capacity(specs.len());
        for spec in specs {
            let value = match raw.get(spec.key) {
                Some(entry) => Presence::Present(read_field(spec, entry)?),
                None => {
                    log::debug!("field {} is missing (no '{}' entry)", spec.name, spec.key);
                    Presence::Missing
                }
            };
            fields.push(ViewField { spec: *spec, value });
        }
        Ok(Self { plugin, fields })
    }

    /// Produces an updated copy of `raw` with every present field merged in.
    ///
    /// Existing entries keep their form and declared type name and are only rewritten
    /// when the value actually differs; new keys are appended as wrapped entries.
    /// Missing fields and unrelated keys are left exactly as they were.
    pub fn merge_into(&self, raw: &RawDocument) -> Result<RawDocument, CoreError> {
        let mut out = raw.clone();
        for field in &self.fields {
            let Presence::Present(scalar) = &field.value else {
                continue;
            };
            let spec = &field.spec;
            match out.get_mut(spec.key) {
                Some(entry) => {
                    if entry.scalar().ok().as_ref() == Some(scalar) {
                        continue;
                    }
                    entry
                        .set_scalar(scalar)
                        .map_err(|e| CoreError::conversion(spec.name, spec.tag, e))?;
                }
                None => {
                    log::debug!("adding wrapped entry '{}' for {}", spec.key, spec.name);
                    out.insert(Entry::wrapped_scalar(spec.key, scalar));
                }
            }
        }
        Ok(out)
    }

    pub fn plugin_id(&self) -> &'static str {
        self.plugin
    }

    pub fn fields(&self) -> &[ViewField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Presence<Scalar>> {
        self.fields
            .iter()
            .find(|field| field.spec.name == name)
            .map(|field| &field.value)
    }

    pub fn set(&mut self, name: &str, scalar: Scalar) -> Result<(), CoreError> {
        let field = self.field_mut(name)?;
        let spec = field.spec;
        check_scalar(&spec, &scalar)
            .map_err(|e| CoreError::conversion(spec.name, spec.tag, e))?;
        field.value = Presence::Present(scalar);
        Ok(())
    }

    pub fn set_text(&mut self, name: &str, text: &str) -> Result<(), CoreError> {
        let field = self.field_mut(name)?;
        let spec = field.spec;
        let scalar = Scalar::parse(text, spec.tag)
            .map_err(|e| CoreError::conversion(spec.name, spec.tag, e))?;
        field.value = Presence::Present(scalar);
        Ok(())
    }

    /// Marks a field missing again. Its raw key, if any, is left untouched on merge.
    pub fn clear(&mut self, name: &str) -> Result<(), CoreError> {
        self.field_mut(name)?.value = Presence::Missing;
        Ok(())
    }

    /// Applies `(field, text)` edits one by one; a rejected edit leaves the others intact.
    pub fn apply_text_edits(&mut self, edits: &[(String, String)]) -> EditReport {
        let mut report = EditReport::default();
        for (name, text) in edits {
            let Some(field) = self.fields.iter_mut().find(|f| f.spec.name == name) else {
                report.reject(name, None, "no such field");
                continue;
            };
            match Scalar::parse(text, field.spec.tag) {
                Ok(scalar) => {
                    field.value = Presence::Present(scalar);
                    report.accept(name);
                }
                Err(e) => report.reject(name, Some(field.spec.tag), e.to_string()),
            }
        }
        report
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut ViewField, CoreError> {
        let plugin = self.plugin;
        self.fields
            .iter_mut()
            .find(|field| field.spec.name == name)
            .ok_or_else(|| {
                CoreError::not_found(format!("{plugin} has no field named '{name}'"))
            })
    }
}

/// The entry's own tag (declared, for wrapped entries) must match the field before the
/// value is read, so whatever parses can also be merged back.
fn read_field(spec: &FieldSpec, entry: &Entry) -> Result<Scalar, CoreError> {
    let checked = if entry.tag() == spec.tag {
        Scalar::from_value(entry.value(), spec.tag)
    } else {
        Err(ConversionError::TagMismatch {
            expected: spec.tag,
            found: entry.tag(),
        })
    };
    checked.map_err(|e| {
        CoreError::conversion(&format!("{} at '{}'", spec.name, spec.key), spec.tag, e)
    })
}

fn check_scalar(spec: &FieldSpec, scalar: &Scalar) -> Result<(), ConversionError> {
    scalar.validate()?;
    if scalar.tag() != spec.tag {
        return Err(ConversionError::TagMismatch {
            expected: spec.tag,
            found: scalar.tag(),
        });
    }
    Ok(())
}
