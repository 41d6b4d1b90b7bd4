//! Corpus ingestion: category directories → chunks → embeddings.

use crate::chunker::chunk_text;
use crate::corpus::CorpusStore;
use crate::embeddings::Embedder;
use crate::extract::DocumentExtractor;
use crate::types::BuildReport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use storyloom_core::{AppError, AppResult};
use walkdir::{DirEntry, WalkDir};

/// Everything an ingestion pass produces.
#[derive(Debug)]
pub struct IngestOutput {
    pub store: CorpusStore,

    /// One vector per chunk in `store`, by global position
    pub vectors: Vec<Vec<f32>>,

    pub report: BuildReport,
}

/// Ingest every document under `root`.
///
/// Each direct subdirectory of `root` is a category; each direct file of a
/// category is a document. Both are visited in file-name order and hidden
/// entries are skipped. A document whose extraction or embedding fails, or
/// which yields no text, is skipped with a warning.
pub async fn ingest_corpus(
    root: &Path,
    extractor: Arc<dyn DocumentExtractor>,
    embedder: &Embedder,
    chunk_size: usize,
) -> AppResult<IngestOutput> {
    let start = Instant::now();
    let mut store = CorpusStore::new();
    let mut vectors = Vec::new();
    let mut report = BuildReport::default();

    tracing::info!("Ingesting corpus at {:?} (chunk size: {})", root, chunk_size);

    if !root.is_dir() {
        warn(&mut report, format!("Corpus root {:?} does not exist or is not a directory", root));
    } else {
        for (category, dir) in list_entries(root, &mut report, |e| e.file_type().is_dir()) {
            store.add_category(&category);
            report.categories.insert(category.clone());

            let documents = list_entries(&dir, &mut report, |e| e.file_type().is_file());
            for (name, path) in documents {
                if !extractor.supports(&path) {
                    tracing::debug!("Ignoring unsupported file {:?}", path);
                    continue;
                }

                match ingest_document(&path, Arc::clone(&extractor), embedder, chunk_size).await {
                    Ok(Some((chunks, embedded))) => {
                        let range = store.append(&category, chunks);
                        tracing::debug!(
                            "Indexed '{}/{}': chunks {}..{}",
                            category,
                            name,
                            range.start,
                            range.end
                        );
                        vectors.extend(embedded);
                        report.documents_indexed += 1;
                    }
                    Ok(None) => {
                        report.documents_skipped += 1;
                        warn(&mut report, format!("Skipped {:?}: no text extracted", path));
                    }
                    Err(e) => {
                        report.documents_skipped += 1;
                        warn(&mut report, format!("Skipped {:?}: {}", path, e));
                    }
                }
            }
        }
    }

    if store.is_empty() {
        warn(&mut report, "No chunks were produced; the index will not be built".to_string());
    }

    report.chunks_indexed = store.len();
    report.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Ingestion completed: {} chunks from {} documents in {} categories ({} skipped) in {:.2}s",
        report.chunks_indexed,
        report.documents_indexed,
        report.categories.len(),
        report.documents_skipped,
        report.duration_secs
    );

    Ok(IngestOutput {
        store,
        vectors,
        report,
    })
}

/// Extract, chunk and embed one document. `None` when it has no words.
async fn ingest_document(
    path: &Path,
    extractor: Arc<dyn DocumentExtractor>,
    embedder: &Embedder,
    chunk_size: usize,
) -> AppResult<Option<(Vec<crate::types::Chunk>, Vec<Vec<f32>>)>> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
        .await
        .map_err(|e| AppError::Extraction(format!("Extraction task failed: {}", e)))??;

    let chunks = chunk_text(&text, chunk_size);
    if chunks.is_empty() {
        return Ok(None);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text().to_string()).collect();
    let embedded = embedder.embed(&texts).await?;

    Ok(Some((chunks, embedded)))
}

/// Direct, non-hidden children of `dir` accepted by `keep`, by file name.
fn list_entries(
    dir: &Path,
    report: &mut BuildReport,
    keep: impl Fn(&DirEntry) -> bool,
) -> Vec<(String, PathBuf)> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn(report, format!("Cannot read entry in {:?}: {}", dir, e));
                continue;
            }
        };

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn(report, format!("Skipped non UTF-8 path {:?}", entry.path()));
            continue;
        };

        if name.starts_with('.') || !keep(&entry) {
            continue;
        }

        entries.push((name, entry.into_path()));
    }

    entries
}

fn warn(report: &mut BuildReport, message: String) {
    tracing::warn!("{}", message);
    report.warnings.push(message);
}
