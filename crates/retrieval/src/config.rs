//! Retrieval configuration management.

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::embeddings::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use storyloom_core::config::STATE_DIR;
use storyloom_core::{AppError, AppResult};

/// Settings for corpus ingestion and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Corpus root, relative to the workspace unless absolute
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Chunk length in words
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Default number of chunks returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("books")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            chunk_size: default_chunk_size(),
            top_k: default_top_k(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Absolute corpus root for `workspace`.
    pub fn corpus_root(&self, workspace: &Path) -> PathBuf {
        if self.corpus_dir.is_absolute() {
            self.corpus_dir.clone()
        } else {
            workspace.join(&self.corpus_dir)
        }
    }
}

/// Load retrieval configuration, or defaults when no file exists.
pub fn load_config(workspace: &Path) -> AppResult<RetrievalConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No retrieval config at {:?}, using defaults", config_path);
        return Ok(RetrievalConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: RetrievalConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;
    config.embedding.validate()?;

    tracing::debug!("Loaded retrieval config from {:?}", config_path);
    Ok(config)
}

/// Save retrieval configuration.
pub fn save_config(workspace: &Path, config: &RetrievalConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved retrieval config to {:?}", config_path);
    Ok(())
}

/// Get the path to the retrieval config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("retrieval.yaml")
}

/// Get the path to the corpus snapshot.
pub fn get_snapshot_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("snapshot.bin")
}
