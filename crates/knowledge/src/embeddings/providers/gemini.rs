//! Gemini embedding provider.
//!
//! Calls `models/{model}:embedContent` on the Generative Language API.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::provider::{check_vector, EmbeddingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use support_core::{AppError, AppResult};
use support_llm::providers::gemini::DEFAULT_GEMINI_URL;
use tracing::{debug, instrument};

/// Gemini embedding provider.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
}

impl std::fmt::Debug for GeminiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiEmbedder {
    /// Create a provider from configuration and an API key.
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Config("Gemini API key cannot be empty".to_string()));
        }

        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for Gemini: {}", e))
        })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.trim_start_matches("models/").to_string(),
            dimensions: config.dimensions,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:embedContent", self.base_url, self.model)
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, String> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: [Part { text }],
            },
        };

        debug!("Sending embedding request to Gemini model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Failed to send request to Gemini: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&error_text) {
                return Err(format!("Gemini API error ({}): {}", status, envelope.error.message));
            }
            return Err(format!("Gemini API error ({}): {}", status, error_text));
        }

        let body: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Gemini response: {}", e))?;

        body.embedding
            .map(|embedding| embedding.values)
            .ok_or_else(|| "Gemini response carried no embedding".to_string())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "gemini", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = self
            .request_embedding(text)
            .await
            .map_err(AppError::EmbeddingUnavailable)?;

        check_vector(self.dimensions, vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(endpoint: Option<&str>) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "gemini".to_string(),
            model: "models/embedding-001".to_string(),
            dimensions: None,
            endpoint: endpoint.map(String::from),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_endpoint_strips_models_prefix() {
        let provider = GeminiEmbedder::new(&config(None), "key").unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent"
        );
        assert_eq!(provider.model_name(), "embedding-001");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(GeminiEmbedder::new(&config(None), "").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = GeminiEmbedder::new(&config(None), "secret-key").unwrap();
        assert!(!format!("{:?}", provider).contains("secret-key"));
    }

    #[test]
    fn test_request_shape() {
        let request = EmbedContentRequest {
            model: "models/embedding-001".to_string(),
            content: Content {
                parts: [Part { text: "Refunds take 5 days." }],
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "models/embedding-001");
        assert_eq!(json["content"]["parts"][0]["text"], "Refunds take 5 days.");
    }

    #[test]
    fn test_response_parsing() {
        let body: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding":{"values":[0.1,0.2,0.3]}}"#).unwrap();
        assert_eq!(body.embedding.unwrap().values, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let provider = GeminiEmbedder::new(&config(Some("http://127.0.0.1:9")), "key").unwrap();
        let result = provider.embed("hello").await;
        assert!(matches!(result, Err(AppError::EmbeddingUnavailable(_))));
    }
}
