//! Persistence scenarios.

use super::{keyword_embedder, trigram_embedder, write_doc};
use crate::config::{get_snapshot_path, save_config, RetrievalConfig};
use crate::context::RetrievalContext;
use crate::embeddings::{Embedder, EmbeddingConfig};
use crate::extract::FileExtractor;
use std::fs;
use std::sync::Arc;
use storyloom_core::AppError;
use tempfile::TempDir;

const QUERIES: &[&str] = &["dragon", "frozen river", "starship", "gold hoard knight"];

#[tokio::test]
async fn test_saved_snapshot_answers_identically() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("books");
    write_doc(&root, "fantasy", "a.txt", "the dragon guarded a hoard of gold");
    write_doc(&root, "fantasy", "b.txt", "a knight crossed the frozen river");
    write_doc(&root, "scifi", "a.txt", "the starship drifted past jupiter");

    let (built, _) = RetrievalContext::build(&root, Arc::new(FileExtractor), trigram_embedder(), 4)
        .await
        .unwrap();
    let path = temp.path().join("snapshot.bin");
    built.save(&path).unwrap();

    let loaded = RetrievalContext::load(&path, trigram_embedder()).unwrap();

    assert_eq!(loaded.store(), built.store());
    for query in QUERIES {
        for category in [None, Some("fantasy"), Some("scifi")] {
            assert_eq!(
                loaded.retrieve_scored(query, category, 3).await,
                built.retrieve_scored(query, category, 3).await
            );
        }
    }
}

#[tokio::test]
async fn test_snapshot_from_other_embedder_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("books");
    write_doc(&root, "fantasy", "a.txt", "dragon castle");

    let (built, _) = RetrievalContext::build(&root, Arc::new(FileExtractor), trigram_embedder(), 500)
        .await
        .unwrap();
    let path = temp.path().join("snapshot.bin");
    built.save(&path).unwrap();

    let result = RetrievalContext::load(&path, keyword_embedder());
    assert!(matches!(result, Err(AppError::Snapshot(_))));
}

#[tokio::test]
async fn test_corrupt_snapshot_is_rebuilt_on_open() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path();
    write_doc(&workspace.join("books"), "fantasy", "a.txt", "dragon castle");

    let path = get_snapshot_path(workspace);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"SLSNAP01 but then nonsense").unwrap();

    assert!(matches!(
        RetrievalContext::load(&path, trigram_embedder()),
        Err(AppError::Snapshot(_))
    ));

    let context = crate::open(workspace).await.unwrap();
    assert_eq!(context.store().len(), 1);

    let workspace_embedder = Arc::new(Embedder::from_config(&EmbeddingConfig::default()).unwrap());
    let reloaded = RetrievalContext::load(&path, workspace_embedder).unwrap();
    assert_eq!(reloaded.store(), context.store());
}

#[tokio::test]
async fn test_workspace_ingest_and_stats() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path();
    save_config(
        workspace,
        &RetrievalConfig {
            chunk_size: 3,
            ..Default::default()
        },
    )
    .unwrap();
    write_doc(&workspace.join("books"), "A", "a.txt", "one two three four five six seven");
    write_doc(&workspace.join("books"), "B", "b.txt", "eight nine");

    assert!(matches!(
        crate::stats(workspace),
        Err(AppError::IndexUnavailable(_))
    ));

    let report = crate::ingest(workspace, None).await.unwrap();
    assert_eq!(report.chunks_indexed, 4);

    let stats = crate::stats(workspace).unwrap();
    assert_eq!(stats.chunks, 4);
    assert_eq!(stats.categories["A"], 3);
    assert_eq!(stats.categories["B"], 1);
    assert_eq!(stats.dimension, Some(384));
    assert_eq!(stats.chunk_size, 3);
    assert!(stats.file_size_bytes > 0);
}

#[tokio::test]
async fn test_ingest_with_corpus_override() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    let library = temp.path().join("library");
    write_doc(&library, "myth", "zeus.txt", "thunder on olympus");

    let report = crate::ingest(&workspace, Some(&library)).await.unwrap();
    assert_eq!(report.chunks_indexed, 1);

    let context = crate::open(&workspace).await.unwrap();
    assert_eq!(context.retrieve("thunder", Some("myth"), 1).await.len(), 1);
}

#[tokio::test]
async fn test_empty_corpus_snapshot_roundtrip() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path();

    let report = crate::ingest(workspace, None).await.unwrap();
    assert_eq!(report.chunks_indexed, 0);

    let stats = crate::stats(workspace).unwrap();
    assert_eq!(stats.chunks, 0);
    assert_eq!(stats.dimension, None);

    let context = crate::open(workspace).await.unwrap();
    assert!(context.retrieve("anything", None, 5).await.is_empty());
}
