//! Error types for storyloom.
//!
//! A single error enum covers configuration, I/O, the retrieval pipeline
//! (extraction, embedding, indexing, snapshots), generation and the
//! flat-file session store.

use thiserror::Error;

/// Unified error type for storyloom.
///
/// Retrieval-side variants are mostly recovered close to where they occur:
/// extraction failures skip a document, embedding and index failures at
/// query time degrade to an empty result. `Generation` is the one variant
/// that is meant to reach the user.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be read or yielded no usable text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The embedding provider failed or returned inconsistent vectors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// No index has been built (empty corpus or not yet ingested)
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Vector index construction or search errors
    #[error("Index error: {0}")]
    Index(String),

    /// Persisted snapshot is missing, corrupt or incompatible
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// The LLM completion call failed or timed out
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Story template could not be loaded or rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Session/history store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_message() {
        let err = AppError::Generation("request timed out after 60s".to_string());
        assert_eq!(
            err.to_string(),
            "Generation failed: request timed out after 60s"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
