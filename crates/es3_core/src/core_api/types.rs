use serde::Serialize;

use crate::entry::EntryForm;
use crate::tag::ValueTag;

/// Lifecycle of a [`super::Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentState {
    Unloaded,
    Loaded,
    Mutated,
    /// Saved; behaves like `Loaded` against the newly encoded bytes.
    Persisted,
    /// A codec call failed. Only a fresh load leaves this state.
    Error,
}

impl DocumentState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded | Self::Mutated | Self::Persisted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRow {
    pub key: String,
    pub tag: ValueTag,
    pub form: EntryForm,
    pub type_name: Option<String>,
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub target: String,
    pub expected: Option<ValueTag>,
    pub reason: String,
}

/// Outcome of a batch of text edits. A rejected edit never blocks the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditReport {
    pub applied: Vec<String>,
    pub rejected: Vec<Rejection>,
}

impl EditReport {
    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn merge(&mut self, other: EditReport) {
        self.applied.extend(other.applied);
        self.rejected.extend(other.rejected);
    }

    pub(crate) fn accept(&mut self, target: &str) {
        self.applied.push(target.to_string());
    }

    pub(crate) fn reject(
        &mut self,
        target: &str,
        expected: Option<ValueTag>,
        reason: impl Into<String>,
    ) {
        let reason = reason.into();
        log::warn!("rejected edit for {target}: {reason}");
        self.rejected.push(Rejection {
            target: target.to_string(),
            expected,
            reason,
        });
    }
}
