//! Retrieval type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A contiguous run of whitespace-delimited words from one source document.
///
/// Chunks are created during ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chunk {
    text: String,
}

impl Chunk {
    pub(crate) fn new(text: String) -> Self {
        Self { text }
    }

    /// The chunk text, words joined by single spaces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of words in the chunk.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Outcome of building the corpus from a document directory tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    /// Chunks that made it into the index
    pub chunks_indexed: usize,

    /// Every category directory found, including empty ones
    pub categories: BTreeSet<String>,

    /// Documents skipped and other non-fatal problems, in encounter order
    pub warnings: Vec<String>,

    /// Documents that contributed at least one chunk
    pub documents_indexed: usize,

    /// Documents skipped because extraction or embedding failed, or they had no text
    pub documents_skipped: usize,

    /// Wall-clock duration of the build in seconds
    pub duration_secs: f64,
}

/// A retrieval hit with its global position and squared L2 distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Position in the global chunk sequence
    pub position: usize,

    /// Squared Euclidean distance to the query embedding
    pub distance: f32,

    /// Chunk text
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_word_count() {
        let chunk = Chunk::new("the quick brown fox".to_string());
        assert_eq!(chunk.word_count(), 4);
        assert_eq!(chunk.text(), "the quick brown fox");
    }

    #[test]
    fn test_chunk_serializes_as_plain_string() {
        let chunk = Chunk::new("once upon a time".to_string());
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(json, "\"once upon a time\"");
    }
}
