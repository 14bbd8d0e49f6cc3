//! Game plugins: the bridge between a raw document and a game's structured view.

pub mod phasmophobia;
mod registry;

use std::path::PathBuf;

use serde::Serialize;

use crate::core_api::{CoreError, CoreErrorCode, RawDocument};
use crate::view::{FieldSpec, StructuredView};

pub use registry::{all_plugins, plugin_by_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveLocation {
    pub label: String,
    pub path: PathBuf,
}

/// Capabilities one game provides. Implementations hold no per-document state.
pub trait GamePlugin: Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// Candidate save files, most likely first.
    fn default_locations(&self) -> Vec<SaveLocation>;

    /// Key material handed to the container codec.
    fn codec_key(&self) -> &'static str;

    fn fields(&self) -> &'static [FieldSpec];

    fn parse(&self, raw: &RawDocument) -> Result<StructuredView, CoreError> {
        StructuredView::parse(self.id(), self.fields(), raw)
    }

    /// Merges `view` into a copy of `raw`; `raw` itself is never modified.
    fn serialize(
        &self,
        view: &StructuredView,
        raw: &RawDocument,
    ) -> Result<RawDocument, CoreError> {
        if view.plugin_id() != self.id() {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!(
                    "view belongs to plugin '{}', not '{}'",
                    view.plugin_id(),
                    self.id()
                ),
            ));
        }
        view.merge_into(raw)
    }
}
