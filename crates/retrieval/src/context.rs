//! The retrieval context: corpus, global index and embedder, built once and
//! shared read-only by every request.

use crate::corpus::CorpusStore;
use crate::embeddings::{EmbedderFingerprint, Embedder};
use crate::extract::DocumentExtractor;
use crate::index::FlatIndex;
use crate::ingest::ingest_corpus;
use crate::snapshot::{read_snapshot, write_snapshot, CorpusSnapshot};
use crate::types::BuildReport;
use std::path::Path;
use std::sync::Arc;
use storyloom_core::{AppError, AppResult};

/// Immutable retrieval state. Share it as `Arc<RetrievalContext>`.
#[derive(Debug)]
pub struct RetrievalContext {
    pub(crate) store: CorpusStore,
    pub(crate) index: Option<FlatIndex>,
    pub(crate) embedder: Arc<Embedder>,
    chunk_size: usize,
}

impl RetrievalContext {
    /// Ingest `root`, embed every chunk and build the global index.
    ///
    /// An empty corpus is not an error; the context simply has no index.
    pub async fn build(
        root: &Path,
        extractor: Arc<dyn DocumentExtractor>,
        embedder: Arc<Embedder>,
        chunk_size: usize,
    ) -> AppResult<(Self, BuildReport)> {
        let output = ingest_corpus(root, extractor, &embedder, chunk_size).await?;

        let index = if output.vectors.is_empty() {
            None
        } else {
            let index = FlatIndex::build(&output.vectors)?;
            tracing::info!(
                "Built index: {} vectors of dimension {}",
                index.len(),
                index.dimension()
            );
            Some(index)
        };

        let context = Self {
            store: output.store,
            index,
            embedder,
            chunk_size,
        };
        Ok((context, output.report))
    }

    /// Adopt a loaded snapshot. Fails if it was built by a different embedder.
    pub fn from_snapshot(snapshot: CorpusSnapshot, embedder: Arc<Embedder>) -> AppResult<Self> {
        let expected = embedder.fingerprint();
        if snapshot.fingerprint != expected {
            return Err(AppError::Snapshot(format!(
                "Snapshot was built with embedder '{}' but '{}' is configured",
                snapshot.fingerprint, expected
            )));
        }

        if let Some(ref index) = snapshot.index {
            embedder.expect_dimension(index.dimension()).map_err(|_| {
                AppError::Snapshot(format!(
                    "Snapshot dimension {} does not match the embedder",
                    index.dimension()
                ))
            })?;
        }

        Ok(Self {
            store: snapshot.store,
            index: snapshot.index,
            embedder,
            chunk_size: snapshot.chunk_size,
        })
    }

    /// Load a persisted snapshot from `path`.
    pub fn load(path: &Path, embedder: Arc<Embedder>) -> AppResult<Self> {
        let snapshot = read_snapshot(path)?;
        let context = Self::from_snapshot(snapshot, embedder)?;
        tracing::info!(
            "Loaded snapshot from {:?}: {} chunks in {} categories",
            path,
            context.store.len(),
            context.store.category_names().count()
        );
        Ok(context)
    }

    /// Persist chunks, categories and index as one snapshot.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        write_snapshot(
            path,
            &self.fingerprint(),
            self.chunk_size,
            &self.store,
            self.index.as_ref(),
        )
    }

    /// Load the snapshot at `snapshot_path` if it is usable with the current
    /// embedder and chunk size; otherwise build from `root` and persist.
    ///
    /// Returns the build report when a build happened.
    pub async fn open_or_build(
        snapshot_path: &Path,
        root: &Path,
        extractor: Arc<dyn DocumentExtractor>,
        embedder: Arc<Embedder>,
        chunk_size: usize,
    ) -> AppResult<(Self, Option<BuildReport>)> {
        if snapshot_path.exists() {
            match Self::load(snapshot_path, Arc::clone(&embedder)) {
                Ok(context) if context.chunk_size == chunk_size => return Ok((context, None)),
                Ok(context) => tracing::info!(
                    "Snapshot chunk size {} differs from configured {}, rebuilding",
                    context.chunk_size,
                    chunk_size
                ),
                Err(e) => tracing::warn!("Cannot use snapshot {:?}, rebuilding: {}", snapshot_path, e),
            }
        }

        let (context, report) = Self::build(root, extractor, embedder, chunk_size).await?;
        context.save(snapshot_path)?;
        Ok((context, Some(report)))
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    /// Global index, `None` for an empty corpus.
    pub fn index(&self) -> Option<&FlatIndex> {
        self.index.as_ref()
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn fingerprint(&self) -> EmbedderFingerprint {
        self.embedder.fingerprint()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
