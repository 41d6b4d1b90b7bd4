//! Corpus store: the global chunk sequence and per-category position sets.
//!
//! Category membership is recorded as positions into the global sequence,
//! never by comparing chunk text, so identical passages in two categories
//! stay attributed to the category they were ingested under.

use crate::types::Chunk;
use std::collections::BTreeMap;
use std::ops::Range;
use storyloom_core::{AppError, AppResult};

/// Chunks in ingestion order plus the category → positions mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStore {
    chunks: Vec<Chunk>,
    categories: BTreeMap<String, Vec<usize>>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category, even if it never receives chunks.
    pub fn add_category(&mut self, name: &str) {
        self.categories.entry(name.to_string()).or_default();
    }

    /// Append a document's chunks to the global sequence and to `category`.
    ///
    /// Returns the global positions the chunks were assigned.
    pub fn append(&mut self, category: &str, chunks: Vec<Chunk>) -> Range<usize> {
        let start = self.chunks.len();
        self.chunks.extend(chunks);
        let end = self.chunks.len();

        self.categories
            .entry(category.to_string())
            .or_default()
            .extend(start..end);

        start..end
    }

    /// Total number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks in global order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    /// Category names in sorted order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Global positions of a category's chunks, in ingestion order.
    ///
    /// `None` for an unknown category, an empty slice for a known category
    /// without chunks.
    pub fn category_positions(&self, name: &str) -> Option<&[usize]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// A category's chunks in ingestion order.
    pub fn category_chunks<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Chunk> + 'a> {
        let positions = self.categories.get(name)?;
        Some(positions.iter().map(move |&p| &self.chunks[p]))
    }

    pub(crate) fn categories(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.categories
    }

    /// Rebuild a store from persisted parts, checking that every position is
    /// in range and strictly increasing within its category, and that every
    /// chunk is owned by exactly one category.
    pub(crate) fn from_parts(
        chunks: Vec<Chunk>,
        categories: BTreeMap<String, Vec<usize>>,
    ) -> AppResult<Self> {
        let mut owned = vec![false; chunks.len()];

        for (name, positions) in &categories {
            let mut previous: Option<usize> = None;
            for &position in positions {
                if position >= chunks.len() {
                    return Err(AppError::Snapshot(format!(
                        "Category '{}' references chunk {} but only {} chunks exist",
                        name,
                        position,
                        chunks.len()
                    )));
                }
                if previous.is_some_and(|p| p >= position) {
                    return Err(AppError::Snapshot(format!(
                        "Category '{}' positions are not in ingestion order",
                        name
                    )));
                }
                if std::mem::replace(&mut owned[position], true) {
                    return Err(AppError::Snapshot(format!(
                        "Chunk {} belongs to more than one category",
                        position
                    )));
                }
                previous = Some(position);
            }
        }

        if let Some(orphan) = owned.iter().position(|o| !o) {
            return Err(AppError::Snapshot(format!(
                "Chunk {} does not belong to any category",
                orphan
            )));
        }

        Ok(Self { chunks, categories })
    }

    pub(crate) fn into_parts(self) -> (Vec<Chunk>, BTreeMap<String, Vec<usize>>) {
        (self.chunks, self.categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts.iter().map(|t| Chunk::new(t.to_string())).collect()
    }

    #[test]
    fn test_categories_partition_global_sequence() {
        let mut store = CorpusStore::new();
        store.append("A", chunks(&["a1", "a2", "a3"]));
        store.append("B", chunks(&["b1", "b2"]));

        assert_eq!(store.len(), 5);
        let a = store.category_positions("A").unwrap();
        let b = store.category_positions("B").unwrap();
        assert_eq!(a, &[0, 1, 2]);
        assert_eq!(b, &[3, 4]);

        let mut all: Vec<usize> = a.iter().chain(b).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..5).collect::<Vec<_>>());
    }

    #[test]
    fn test_interleaved_documents_keep_relative_order() {
        let mut store = CorpusStore::new();
        store.append("A", chunks(&["a1"]));
        store.append("B", chunks(&["b1"]));
        store.append("A", chunks(&["a2"]));

        let texts: Vec<&str> = store.category_chunks("A").unwrap().map(Chunk::text).collect();
        assert_eq!(texts, vec!["a1", "a2"]);
        assert_eq!(store.category_positions("A").unwrap(), &[0, 2]);
    }

    #[test]
    fn test_duplicate_text_stays_in_its_category() {
        let mut store = CorpusStore::new();
        store.append("A", chunks(&["same passage"]));
        store.append("B", chunks(&["same passage"]));

        assert_eq!(store.category_positions("A").unwrap(), &[0]);
        assert_eq!(store.category_positions("B").unwrap(), &[1]);
    }

    #[test]
    fn test_empty_and_unknown_categories() {
        let mut store = CorpusStore::new();
        store.add_category("poetry");

        assert!(store.contains_category("poetry"));
        assert_eq!(store.category_positions("poetry"), Some(&[][..]));
        assert_eq!(store.category_positions("missing"), None);
        assert_eq!(store.category_names().collect::<Vec<_>>(), vec!["poetry"]);
    }

    #[test]
    fn test_from_parts_rejects_out_of_range() {
        let mut categories = BTreeMap::new();
        categories.insert("A".to_string(), vec![0, 5]);
        let result = CorpusStore::from_parts(chunks(&["a", "b"]), categories);
        assert!(matches!(result, Err(AppError::Snapshot(_))));
    }

    #[test]
    fn test_from_parts_rejects_overlap() {
        let mut categories = BTreeMap::new();
        categories.insert("A".to_string(), vec![0, 1]);
        categories.insert("B".to_string(), vec![1]);
        let result = CorpusStore::from_parts(chunks(&["a", "b"]), categories);
        assert!(matches!(result, Err(AppError::Snapshot(_))));
    }

    #[test]
    fn test_from_parts_rejects_uncategorized_chunks() {
        let mut categories = BTreeMap::new();
        categories.insert("A".to_string(), vec![0]);
        let result = CorpusStore::from_parts(chunks(&["a", "b"]), categories);
        assert!(matches!(result, Err(AppError::Snapshot(_))));
    }

    #[test]
    fn test_parts_roundtrip() {
        let mut store = CorpusStore::new();
        store.append("A", chunks(&["a1", "a2"]));
        store.add_category("empty");

        let (c, cats) = store.clone().into_parts();
        let rebuilt = CorpusStore::from_parts(c, cats).unwrap();
        assert_eq!(rebuilt, store);
    }
}
