//! Embedding engine.
//!
//! Wraps a provider with batching and the dimension invariant: the first
//! batch fixes the dimension and every later vector must match it.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use storyloom_core::{AppError, AppResult};

/// Identifies the vector space a set of embeddings lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderFingerprint {
    pub provider: String,
    pub model: String,
}

impl std::fmt::Display for EmbedderFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Batching, dimension-checking front end over an [`EmbeddingProvider`].
#[derive(Debug)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    dimension: OnceLock<usize>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let dimension = OnceLock::new();
        if let Some(known) = provider.dimensions() {
            let _ = dimension.set(known);
        }
        Self {
            provider,
            batch_size: batch_size.max(1),
            dimension,
        }
    }

    /// Build the provider described by `config`.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let provider = create_provider(config)?;
        tracing::debug!(
            provider = provider.provider_name(),
            model = provider.model_name(),
            batch_size = config.batch_size,
            "Created embedder"
        );
        Ok(Self::new(provider, config.batch_size))
    }

    pub fn fingerprint(&self) -> EmbedderFingerprint {
        EmbedderFingerprint {
            provider: self.provider.provider_name().to_string(),
            model: self.provider.model_name().to_string(),
        }
    }

    /// Embedding dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    /// Check a dimension against the embedder's, pinning it if still unknown.
    pub fn expect_dimension(&self, dimension: usize) -> AppResult<()> {
        self.check_dimension(dimension)
    }

    /// Embed texts in provider batches of `batch_size`, preserving order.
    pub async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let embedded = self.provider.embed_batch(batch).await?;
            if embedded.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "{} returned {} embeddings for {} texts",
                    self.provider.provider_name(),
                    embedded.len(),
                    batch.len()
                )));
            }
            for vector in &embedded {
                self.check_dimension(vector.len())?;
            }
            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    fn check_dimension(&self, found: usize) -> AppResult<()> {
        if found == 0 {
            return Err(AppError::Embedding(
                "Provider returned a zero-length embedding".to_string(),
            ));
        }
        let expected = *self.dimension.get_or_init(|| found);
        if expected != found {
            return Err(AppError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                expected, found
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns vectors whose length grows with every batch.
    #[derive(Debug, Default)]
    struct GrowingProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for GrowingProvider {
        fn provider_name(&self) -> &str {
            "growing"
        }

        fn model_name(&self) -> &str {
            "g1"
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            let dim = 2 + self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0; dim]).collect())
        }
    }

    #[tokio::test]
    async fn test_embed_preserves_order_across_batches() {
        let embedder = Embedder::from_config(&EmbeddingConfig {
            batch_size: 2,
            dimensions: 32,
            ..Default::default()
        })
        .unwrap();

        let texts: Vec<String> = ["dragon", "castle", "forest", "dragon", "ocean"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let vectors = embedder.embed(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(vectors[0], vectors[3]);
        assert_eq!(embedder.dimension(), Some(32));
        assert_eq!(embedder.embed_one("dragon").await.unwrap(), vectors[0]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_between_batches() {
        let embedder = Embedder::new(Arc::new(GrowingProvider::default()), 1);
        let texts = vec!["a".to_string(), "b".to_string()];

        let result = embedder.embed(&texts).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert_eq!(embedder.dimension(), Some(2));
    }

    #[tokio::test]
    async fn test_expected_dimension_is_enforced() {
        let embedder = Embedder::new(Arc::new(GrowingProvider::default()), 8);
        embedder.expect_dimension(5).unwrap();

        let result = embedder.embed_one("query").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[test]
    fn test_known_dimension_rejects_other() {
        let embedder = Embedder::from_config(&EmbeddingConfig {
            dimensions: 16,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(embedder.dimension(), Some(16));
        assert!(embedder.expect_dimension(32).is_err());
        assert!(embedder.expect_dimension(16).is_ok());
    }

    #[test]
    fn test_fingerprint() {
        let embedder = Embedder::from_config(&EmbeddingConfig::default()).unwrap();
        let fingerprint = embedder.fingerprint();
        assert_eq!(fingerprint.provider, "trigram");
        assert_eq!(fingerprint.model, "trigram-v1");
        assert_eq!(fingerprint.to_string(), "trigram/trigram-v1");
    }
}
