use indexmap::IndexMap;

use crate::codec::Mapping;
use crate::entry::Entry;

use super::types::EntryRow;

/// Decoded entries in document order, paired with the bytes they were decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    entries: IndexMap<String, Entry>,
    original: Vec<u8>,
}

impl RawDocument {
    pub fn from_mapping(original: Vec<u8>, mapping: Mapping) -> Self {
        let entries = mapping
            .into_iter()
            .map(|(key, raw)| (key.clone(), Entry::from_raw(key, raw)))
            .collect();
        Self { entries, original }
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    /// Inserts or replaces an entry. A replaced entry keeps its position; a new one is
    /// appended.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.key().to_string(), entry)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn rows(&self) -> Vec<EntryRow> {
        self.entries
            .values()
            .map(|entry| EntryRow {
                key: entry.key().to_string(),
                tag: entry.tag(),
                form: entry.form(),
                type_name: entry.type_name().map(str::to_string),
                display: entry.display_text(),
            })
            .collect()
    }

    /// The mapping handed to a codec for encoding.
    pub fn to_mapping(&self) -> Mapping {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.to_raw()))
            .collect()
    }

    pub(crate) fn rebind(&mut self, original: Vec<u8>) {
        self.original = original;
    }
}
