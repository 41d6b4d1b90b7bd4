//! Crate-level scenario tests.

mod snapshot_scenarios;

use crate::embeddings::{Embedder, EmbeddingConfig, EmbeddingProvider};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use storyloom_core::{AppError, AppResult};

pub(crate) fn write_doc(root: &Path, category: &str, name: &str, text: &str) {
    let dir = root.join(category);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), text).unwrap();
}

pub(crate) fn trigram_embedder() -> Arc<Embedder> {
    Arc::new(
        Embedder::from_config(&EmbeddingConfig {
            dimensions: 128,
            ..Default::default()
        })
        .unwrap(),
    )
}

/// Counts occurrences of a small vocabulary; fails on the word "explode".
#[derive(Debug)]
pub(crate) struct KeywordProvider;

const VOCABULARY: &[&str] = &["dragon", "knight", "ship", "robot", "castle", "star"];

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "vocab-6"
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                if text.contains("explode") {
                    return Err(AppError::Embedding("refusing to embed".to_string()));
                }
                Ok(VOCABULARY
                    .iter()
                    .map(|word| text.split_whitespace().filter(|w| w == word).count() as f32)
                    .collect())
            })
            .collect()
    }
}

pub(crate) fn keyword_embedder() -> Arc<Embedder> {
    Arc::new(Embedder::new(Arc::new(KeywordProvider), 16))
}
