//! Fixed-size, word-bounded text chunking.

use crate::types::Chunk;

/// Default chunk length in words.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Split text into consecutive, non-overlapping windows of `size` words.
///
/// Words are whitespace-delimited; each chunk's text is its words joined by a
/// single space. The last chunk may be shorter. Empty or whitespace-only
/// input yields no chunks. A `size` of 0 is treated as 1.
pub fn chunk_text(text: &str, size: usize) -> Vec<Chunk> {
    let size = size.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    let chunks: Vec<Chunk> = words
        .chunks(size)
        .map(|window| Chunk::new(window.join(" ")))
        .collect();

    tracing::debug!(
        "Chunked {} words into {} chunks (size: {})",
        words.len(),
        chunks.len(),
        size
    );

    chunks
}
