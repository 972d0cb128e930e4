//! Embedding configuration.

use std::time::Duration;
use support_core::AppConfig;

/// Settings needed to build an embedding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "gemini", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Expected vector length; responses of any other length are rejected
    pub dimensions: Option<usize>,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Dimensionality used by the mock provider when none is configured.
pub const DEFAULT_MOCK_DIMENSIONS: usize = 384;

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: Some(DEFAULT_MOCK_DIMENSIONS),
            endpoint: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl EmbeddingConfig {
    /// Derive the embedding settings from the application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            endpoint: config.endpoint_for(&config.embedding_provider),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_config() {
        let mut app = AppConfig::default();
        app.embedding_provider = "ollama".to_string();
        app.embedding_model = "nomic-embed-text".to_string();
        app.embedding_dimensions = Some(768);
        app.request_timeout_secs = 10;

        let config = EmbeddingConfig::from_app_config(&app);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.dimensions, Some(768));
        assert_eq!(config.endpoint, None);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
