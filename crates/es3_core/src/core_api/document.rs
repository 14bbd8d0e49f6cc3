use crate::codec::Codec;
use crate::nested::NestedEditor;
use crate::tag::ValueTag;

use super::error::{CoreError, CoreErrorCode};
use super::raw::RawDocument;
use super::types::{DocumentState, EditReport};

/// A save document bound to one codec and key.
///
/// Not meant to be shared between callers: each load/mutate/save sequence owns the
/// document exclusively.
#[derive(Debug)]
pub struct Document<C> {
    codec: C,
    key: String,
    raw: Option<RawDocument>,
    state: DocumentState,
}

impl<C: Codec> Document<C> {
    pub fn new(codec: C, key: impl Into<String>) -> Self {
        Self {
            codec,
            key: key.into(),
            raw: None,
            state: DocumentState::Unloaded,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decodes `bytes` and replaces whatever was loaded before.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<&RawDocument, CoreError> {
        let mapping = match self.codec.decode(&bytes, &self.key) {
            Ok(mapping) => mapping,
            Err(e) => {
                self.raw = None;
                self.state = DocumentState::Error;
                return Err(e.into());
            }
        };

        log::info!(
            "loaded document: {} entries from {} bytes",
            mapping.len(),
            bytes.len()
        );
        self.state = DocumentState::Loaded;
        Ok(&*self.raw.insert(RawDocument::from_mapping(bytes, mapping)))
    }

    pub fn raw(&self) -> Result<&RawDocument, CoreError> {
        self.check_loaded()?;
        self.raw
            .as_ref()
            .ok_or_else(|| CoreError::sequence("no document loaded"))
    }

    /// Replaces the entry mapping with one derived from this document, typically the
    /// output of a plugin's `serialize`.
    pub fn commit(&mut self, updated: RawDocument) -> Result<(), CoreError> {
        let current = self.raw_mut()?;
        if current.original_bytes() != updated.original_bytes() {
            return Err(CoreError::sequence(
                "mapping was derived from a different load of this document",
            ));
        }
        *current = updated;
        self.state = DocumentState::Mutated;
        Ok(())
    }

    pub fn set_entry_text(&mut self, key: &str, text: &str) -> Result<(), CoreError> {
        let entry = self
            .raw_mut()?
            .get_mut(key)
            .ok_or_else(|| CoreError::not_found(format!("no entry named '{key}'")))?;
        let tag = entry.tag();
        entry
            .set_text(text)
            .map_err(|e| CoreError::conversion(key, tag, e))?;
        self.state = DocumentState::Mutated;
        Ok(())
    }

    /// Boolean entries are toggled, never parsed from text.
    pub fn set_entry_bool(&mut self, key: &str, flag: bool) -> Result<(), CoreError> {
        let entry = self
            .raw_mut()?
            .get_mut(key)
            .ok_or_else(|| CoreError::not_found(format!("no entry named '{key}'")))?;
        entry
            .set_bool(flag)
            .map_err(|e| CoreError::conversion(key, ValueTag::Boolean, e))?;
        self.state = DocumentState::Mutated;
        Ok(())
    }

    /// Applies `(key, text)` edits one by one. A failing edit is reported and skipped.
    /// Only sequencing problems abort the whole batch.
    pub fn apply_entry_edits(
        &mut self,
        edits: &[(String, String)],
    ) -> Result<EditReport, CoreError> {
        let raw = self.raw_mut()?;
        let mut report = EditReport::default();

        for (key, text) in edits {
            let Some(entry) = raw.get_mut(key) else {
                report.reject(key, None, "no such entry");
                continue;
            };
            let tag = entry.tag();
            match entry.set_text(text) {
                Ok(()) => report.accept(key),
                Err(e) => report.reject(key, Some(tag), e.to_string()),
            }
        }

        if report.has_changes() {
            self.state = DocumentState::Mutated;
        }
        Ok(report)
    }

    /// Batch form of [`Self::set_entry_bool`], with the same per-key rejection as
    /// [`Self::apply_entry_edits`].
    pub fn apply_entry_toggles(
        &mut self,
        toggles: &[(String, bool)],
    ) -> Result<EditReport, CoreError> {
        let raw = self.raw_mut()?;
        let mut report = EditReport::default();

        for (key, flag) in toggles {
            let Some(entry) = raw.get_mut(key) else {
                report.reject(key, None, "no such entry");
                continue;
            };
            match entry.set_bool(*flag) {
                Ok(()) => report.accept(key),
                Err(e) => report.reject(key, Some(ValueTag::Boolean), e.to_string()),
            }
        }

        if report.has_changes() {
            self.state = DocumentState::Mutated;
        }
        Ok(report)
    }

    pub fn open_nested(&self, key: &str) -> Result<NestedEditor, CoreError> {
        let entry = self
            .raw()?
            .get(key)
            .ok_or_else(|| CoreError::not_found(format!("no entry named '{key}'")))?;
        NestedEditor::open(entry).map_err(|e| CoreError::conversion(key, entry.tag(), e))
    }

    /// Writes an edited nested mapping back into its entry. An emptied mapping is kept
    /// as an empty mapping.
    pub fn apply_nested(&mut self, editor: NestedEditor) -> Result<(), CoreError> {
        let (key, inner) = editor.into_parts();
        let entry = self
            .raw_mut()?
            .get_mut(&key)
            .ok_or_else(|| CoreError::not_found(format!("no entry named '{key}'")))?;
        if entry.nested().is_none() {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("entry '{key}' no longer holds a nested mapping"),
            ));
        }
        entry.set_nested(inner);
        self.state = DocumentState::Mutated;
        Ok(())
    }

    /// Encodes the current mapping using the loaded bytes as the container template.
    ///
    /// On success the document is bound to the returned bytes. On a codec failure the
    /// mapping is left as it was and the document must be loaded again.
    pub fn save(&mut self) -> Result<Vec<u8>, CoreError> {
        self.check_loaded()?;
        let Some(raw) = self.raw.as_mut() else {
            return Err(CoreError::sequence("cannot save: no prior load"));
        };

        let mapping = raw.to_mapping();
        match self.codec.encode(raw.original_bytes(), &self.key, &mapping) {
            Ok(bytes) => {
                log::info!(
                    "encoded document: {} entries into {} bytes",
                    mapping.len(),
                    bytes.len()
                );
                raw.rebind(bytes.clone());
                self.state = DocumentState::Persisted;
                Ok(bytes)
            }
            Err(e) => {
                self.state = DocumentState::Error;
                Err(e.into())
            }
        }
    }

    fn check_loaded(&self) -> Result<(), CoreError> {
        match self.state {
            DocumentState::Unloaded => Err(CoreError::sequence("no prior load")),
            DocumentState::Error => Err(CoreError::sequence(
                "document is in an error state; load it again",
            )),
            _ => Ok(()),
        }
    }

    fn raw_mut(&mut self) -> Result<&mut RawDocument, CoreError> {
        self.check_loaded()?;
        self.raw
            .as_mut()
            .ok_or_else(|| CoreError::sequence("no document loaded"))
    }
}
