//! Corpus retrieval for story generation.
//!
//! Documents under category directories are chunked, embedded and indexed
//! once; queries then find the nearest chunks globally or within a category.

pub mod chunker;
pub mod config;
pub mod context;
pub mod corpus;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod retriever;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::RetrievalConfig;
pub use context::RetrievalContext;
pub use corpus::CorpusStore;
pub use embeddings::{Embedder, EmbedderFingerprint, EmbeddingConfig};
pub use extract::{DocumentExtractor, FileExtractor};
pub use index::{FlatIndex, SearchHit};
pub use retriever::DEFAULT_TOP_K;
pub use snapshot::SnapshotStats;
pub use types::{BuildReport, Chunk, RetrievedChunk};

use std::fs;
use std::path::Path;
use std::sync::Arc;
use storyloom_core::{AppError, AppResult};

/// Build the corpus under the workspace (or `corpus_override`) and persist
/// the snapshot, replacing any previous one.
pub async fn ingest(workspace: &Path, corpus_override: Option<&Path>) -> AppResult<BuildReport> {
    let config = config::load_config(workspace)?;
    let root = corpus_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.corpus_root(workspace));

    let embedder = Arc::new(Embedder::from_config(&config.embedding)?);
    let (context, report) =
        RetrievalContext::build(&root, Arc::new(FileExtractor), embedder, config.chunk_size).await?;

    context.save(&config::get_snapshot_path(workspace))?;
    Ok(report)
}

/// Open the workspace's retrieval context, building it first if there is no
/// usable snapshot.
pub async fn open(workspace: &Path) -> AppResult<Arc<RetrievalContext>> {
    let config = config::load_config(workspace)?;
    let embedder = Arc::new(Embedder::from_config(&config.embedding)?);

    let (context, report) = RetrievalContext::open_or_build(
        &config::get_snapshot_path(workspace),
        &config.corpus_root(workspace),
        Arc::new(FileExtractor),
        embedder,
        config.chunk_size,
    )
    .await?;

    if let Some(report) = report {
        tracing::info!(
            "Built corpus on open: {} chunks, {} warnings",
            report.chunks_indexed,
            report.warnings.len()
        );
    }

    Ok(Arc::new(context))
}

/// Describe the persisted snapshot without building anything.
pub fn stats(workspace: &Path) -> AppResult<SnapshotStats> {
    let path = config::get_snapshot_path(workspace);
    if !path.exists() {
        return Err(AppError::IndexUnavailable(format!(
            "no snapshot at {:?}; run `storyloom ingest` first",
            path
        )));
    }

    let size = fs::metadata(&path)?.len();
    Ok(snapshot::read_snapshot(&path)?.stats(size))
}
