//! Corpus snapshot persistence.
//!
//! File layout: 8-byte magic, 32-byte SHA-256 of the payload, then the
//! bincode payload. Chunks, category positions and index vectors are written
//! and read together so they can never drift apart.

use crate::corpus::CorpusStore;
use crate::embeddings::EmbedderFingerprint;
use crate::index::FlatIndex;
use crate::types::Chunk;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use storyloom_core::{AppError, AppResult};

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"SLSNAP01";
pub const SNAPSHOT_VERSION: u32 = 1;

const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + DIGEST_LEN;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotPayload {
    version: u32,
    fingerprint: EmbedderFingerprint,
    chunk_size: usize,
    dimension: usize,
    chunks: Vec<Chunk>,
    categories: BTreeMap<String, Vec<usize>>,
    vectors: Vec<f32>,
}

/// A validated, in-memory corpus snapshot.
#[derive(Debug)]
pub struct CorpusSnapshot {
    pub fingerprint: EmbedderFingerprint,
    pub chunk_size: usize,
    pub store: CorpusStore,

    /// `None` for an empty corpus
    pub index: Option<FlatIndex>,
}

/// Summary of a snapshot file for `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStats {
    pub chunks: usize,
    pub categories: BTreeMap<String, usize>,
    pub dimension: Option<usize>,
    pub chunk_size: usize,
    pub embedder: String,
    pub file_size_bytes: u64,
}

impl CorpusSnapshot {
    pub fn stats(&self, file_size_bytes: u64) -> SnapshotStats {
        SnapshotStats {
            chunks: self.store.len(),
            categories: self
                .store
                .categories()
                .iter()
                .map(|(name, positions)| (name.clone(), positions.len()))
                .collect(),
            dimension: self.index.as_ref().map(FlatIndex::dimension),
            chunk_size: self.chunk_size,
            embedder: self.fingerprint.to_string(),
            file_size_bytes,
        }
    }
}

/// Write a snapshot atomically: temp sibling file, then rename.
pub fn write_snapshot(
    path: &Path,
    fingerprint: &EmbedderFingerprint,
    chunk_size: usize,
    store: &CorpusStore,
    index: Option<&FlatIndex>,
) -> AppResult<()> {
    if index.map_or(0, FlatIndex::len) != store.len() {
        return Err(AppError::Snapshot(format!(
            "Index holds {} vectors but the corpus has {} chunks",
            index.map_or(0, FlatIndex::len),
            store.len()
        )));
    }

    let payload = SnapshotPayload {
        version: SNAPSHOT_VERSION,
        fingerprint: fingerprint.clone(),
        chunk_size,
        dimension: index.map_or(0, FlatIndex::dimension),
        chunks: store.chunks().to_vec(),
        categories: store.categories().clone(),
        vectors: index.map(|i| i.as_flat().to_vec()).unwrap_or_default(),
    };

    let bytes = encode(&payload)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;

    tracing::info!(
        "Saved snapshot to {:?} ({} chunks, {} bytes)",
        path,
        store.len(),
        bytes.len()
    );

    Ok(())
}

fn encode(payload: &SnapshotPayload) -> AppResult<Vec<u8>> {
    let body = bincode::serialize(payload)
        .map_err(|e| AppError::Snapshot(format!("Failed to encode snapshot: {}", e)))?;
    let digest = Sha256::digest(&body);

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&digest);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Read and validate a snapshot.
pub fn read_snapshot(path: &Path) -> AppResult<CorpusSnapshot> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

fn decode(bytes: &[u8]) -> AppResult<CorpusSnapshot> {
    if bytes.len() < HEADER_LEN || &bytes[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(AppError::Snapshot("Not a storyloom snapshot".to_string()));
    }

    let (digest, body) = bytes[SNAPSHOT_MAGIC.len()..].split_at(DIGEST_LEN);
    if Sha256::digest(body).as_slice() != digest {
        return Err(AppError::Snapshot(
            "Snapshot checksum mismatch (file is corrupt or truncated)".to_string(),
        ));
    }

    let payload: SnapshotPayload = bincode::deserialize(body)
        .map_err(|e| AppError::Snapshot(format!("Failed to decode snapshot: {}", e)))?;

    if payload.version != SNAPSHOT_VERSION {
        return Err(AppError::Snapshot(format!(
            "Unsupported snapshot version {} (expected {})",
            payload.version, SNAPSHOT_VERSION
        )));
    }

    let index = if payload.chunks.is_empty() {
        if !payload.vectors.is_empty() {
            return Err(AppError::Snapshot(
                "Snapshot has vectors but no chunks".to_string(),
            ));
        }
        None
    } else {
        let expected = payload.chunks.len().checked_mul(payload.dimension);
        if payload.dimension == 0 || expected != Some(payload.vectors.len()) {
            return Err(AppError::Snapshot(format!(
                "Snapshot has {} values for {} chunks of dimension {}",
                payload.vectors.len(),
                payload.chunks.len(),
                payload.dimension
            )));
        }
        Some(
            FlatIndex::from_flat(payload.dimension, payload.vectors)
                .map_err(|e| AppError::Snapshot(e.to_string()))?,
        )
    };

    let store = CorpusStore::from_parts(payload.chunks, payload.categories)?;

    Ok(CorpusSnapshot {
        fingerprint: payload.fingerprint,
        chunk_size: payload.chunk_size,
        store,
        index,
    })
}
