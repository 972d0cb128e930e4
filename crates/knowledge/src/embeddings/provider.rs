//! Embedding provider trait and factory.

use crate::embeddings::config::{EmbeddingConfig, DEFAULT_MOCK_DIMENSIONS};
use crate::embeddings::providers::{GeminiEmbedder, MockEmbedder, OllamaEmbedder};
use std::sync::Arc;
use support_core::{AppError, AppResult};

/// Trait for embedding providers.
///
/// Every failure (provider error, network failure, timeout, malformed
/// response) is reported as `AppError::EmbeddingUnavailable`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "ollama", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Expected embedding dimensions, when known up front
    fn dimensions(&self) -> Option<usize>;

    /// Embed a single non-empty text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "mock" => {
            let dimensions = config.dimensions.unwrap_or(DEFAULT_MOCK_DIMENSIONS);
            Ok(Arc::new(MockEmbedder::new(dimensions)))
        }

        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini embedding provider requires API key".to_string())
            })?;
            Ok(Arc::new(GeminiEmbedder::new(config, api_key)?))
        }

        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, ollama, mock",
            config.provider
        ))),
    }
}

/// Reject vectors that are empty or of an unexpected length.
pub(crate) fn check_vector(expected: Option<usize>, vector: Vec<f32>) -> AppResult<Vec<f32>> {
    if vector.is_empty() {
        return Err(AppError::EmbeddingUnavailable(
            "provider returned an empty vector".to_string(),
        ));
    }

    match expected {
        Some(dimensions) if vector.len() != dimensions => Err(AppError::EmbeddingUnavailable(
            format!(
                "unexpected embedding dimensions: got {}, expected {}",
                vector.len(),
                dimensions
            ),
        )),
        _ => Ok(vector),
    }
}
