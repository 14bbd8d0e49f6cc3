mod document;
mod error;
mod raw;
mod types;

pub use document::Document;
pub use error::{CoreError, CoreErrorCode};
pub use raw::RawDocument;
pub use types::{DocumentState, EditReport, EntryRow, Rejection};
