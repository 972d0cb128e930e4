//! Error types for the support agent.
//!
//! This module defines a unified error enum covering configuration, I/O and
//! provider errors, plus the retrieval pipeline's own failure taxonomy.

use thiserror::Error;

/// Unified error type for the support agent.
///
/// All fallible functions return `Result<T, AppError>`.
/// Pipeline stages decide per variant whether a failure is absorbed
/// (logged, degraded result) or surfaced to the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge corpus errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The embedding provider could not produce a vector (provider error,
    /// network failure, timeout or malformed response).
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The query itself could not be embedded; retrieval cannot proceed.
    #[error("Query embedding failed: {0}")]
    QueryEmbeddingFailed(String),

    /// The corpus backing store could not be read.
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// The answer could not be generated.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Follow-up suggestions could not be generated.
    #[error("Follow-up generation failed: {0}")]
    FollowUpGenerationFailed(String),

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
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "faq.txt missing");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("faq.txt missing"));
    }

    #[test]
    fn test_taxonomy_messages() {
        let err = AppError::EmbeddingUnavailable("timeout".to_string());
        assert_eq!(err.to_string(), "Embedding unavailable: timeout");

        let err = AppError::GenerationFailed("HTTP 500".to_string());
        assert_eq!(err.to_string(), "Generation failed: HTTP 500");
    }

    #[test]
    fn test_yaml_error_conversion() {
        let parse: Result<serde_yaml::Value, _> = serde_yaml::from_str("a: [unclosed");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
