//! Embedding configuration.

use serde::{Deserialize, Serialize};
use storyloom_core::{AppError, AppResult};

/// Embedding provider settings, stored under `embedding:` in retrieval.yaml.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_model")]
    pub model: String,

    /// Vector dimensions for providers that generate them locally
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Maximum number of texts handed to the provider at once
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum in-flight requests for network providers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Provider base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_provider() -> String {
    "trigram".to_string()
}

fn default_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    64
}

fn default_concurrency() -> usize {
    4
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Check that numeric settings are usable.
    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AppError::Config(
                "embedding.concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.concurrency, 4);
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EmbeddingConfig =
            serde_yaml::from_str("provider: ollama\nmodel: nomic-embed-text\n").unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = EmbeddingConfig {
            batch_size: 0,
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
