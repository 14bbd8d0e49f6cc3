//! Lossless editing of ES3 save documents.
//!
//! A save is decoded by a [`codec::Codec`] into a mapping of named entries. The
//! [`core_api::Document`] keeps that mapping together with the original bytes so that a
//! save only changes semantic content, and [`games`] plugins project the mapping into a
//! [`view::StructuredView`] and merge edits back without touching unrelated entries.

pub mod codec;
pub mod core_api;
pub mod entry;
pub mod games;
pub mod nested;
pub mod storage;
pub mod tag;
pub mod value;
pub mod view;
