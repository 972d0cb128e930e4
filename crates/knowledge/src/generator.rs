//! Grounded answer generation.

use crate::types::FactsLabel;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use support_core::{AppConfig, AppError, AppResult};
use support_llm::{LlmClient, LlmRequest};
use support_prompt::{build_prompt, builtin_prompt, BuiltPrompt, PromptDefinition, ANSWER_PROMPT_ID};

/// Model parameters shared by every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: None,
            temperature: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: Some(config.max_output_tokens),
            temperature: None,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn request(&self, prompt: &BuiltPrompt) -> LlmRequest {
        let mut request = LlmRequest::new(prompt.user.clone(), self.model.clone());
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(system) = &prompt.system {
            request = request.with_system(system.clone());
        }
        request
    }
}

/// Send a built prompt and return the trimmed text.
///
/// Provider errors, timeouts and blank answers are all reported as
/// `GenerationFailed`.
pub(crate) async fn complete(
    client: &dyn LlmClient,
    settings: &GenerationSettings,
    prompt: &BuiltPrompt,
) -> AppResult<String> {
    let request = settings.request(prompt);

    let response = match tokio::time::timeout(settings.timeout, client.complete(&request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(AppError::GenerationFailed(e.to_string())),
        Err(_) => {
            return Err(AppError::GenerationFailed(format!(
                "{} timed out after {:?}",
                client.provider_name(),
                settings.timeout
            )))
        }
    };

    tracing::debug!(
        "{} answered with {} tokens",
        response.model,
        response.usage.total_tokens
    );

    let content = response.content.trim();
    if content.is_empty() {
        return Err(AppError::GenerationFailed(format!(
            "{} returned an empty answer",
            client.provider_name()
        )));
    }

    Ok(content.to_string())
}

pub(crate) fn builtin(prompt_id: &str) -> AppResult<PromptDefinition> {
    builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Built-in prompt '{}' missing", prompt_id)))
}

/// Turns a query plus retrieved facts into an answer.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: GenerationSettings,
}

impl AnswerGenerator {
    /// Generator using the built-in answer prompt.
    pub fn new(client: Arc<dyn LlmClient>, settings: GenerationSettings) -> AppResult<Self> {
        Ok(Self::with_prompt(client, builtin(ANSWER_PROMPT_ID)?, settings))
    }

    pub fn with_prompt(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            prompt,
            settings,
        }
    }

    /// Render the augmented prompt: query, blank line, label, one fact per line.
    pub fn build_prompt(
        &self,
        query: &str,
        facts: &[String],
        label: FactsLabel,
    ) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert("factsLabel".to_string(), label.as_str().to_string());
        variables.insert("facts".to_string(), facts.join("\n"));
        build_prompt(&self.prompt, variables)
    }

    /// Generate an answer grounded on `facts`.
    pub async fn generate(
        &self,
        query: &str,
        facts: &[String],
        label: FactsLabel,
    ) -> AppResult<String> {
        let prompt = self
            .build_prompt(query, facts, label)
            .map_err(|e| AppError::GenerationFailed(e.to_string()))?;

        tracing::debug!(
            "Generating answer with {} facts via {}",
            facts.len(),
            self.client.provider_name()
        );

        complete(self.client.as_ref(), &self.settings, &prompt).await
    }
}
