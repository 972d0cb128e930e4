//! Request handling for the support agent.
//!
//! [`SupportAgent`] is the boundary callers use: it wires retrieval, answer
//! generation and follow-up suggestions together and turns internal errors
//! into a [`RequestFailure`] that carries no provider detail.

use crate::followup::FollowUpSuggester;
use crate::generator::{AnswerGenerator, GenerationSettings};
use crate::retriever::Retriever;
use crate::types::{FactsLabel, FailureKind, FollowUpResponse, QueryResponse, RequestFailure};
use std::sync::Arc;
use std::time::Duration;
use support_core::{AppConfig, AppError, AppResult};
use support_llm::create_client;
use support_prompt::{load_prompt, ANSWER_PROMPT_ID, FOLLOW_UP_PROMPT_ID};
use tracing::Instrument;
use uuid::Uuid;

/// Map an internal error onto the failure kind reported to the caller.
fn failure_kind(error: &AppError) -> FailureKind {
    match error {
        AppError::QueryEmbeddingFailed(_) | AppError::EmbeddingUnavailable(_) => {
            FailureKind::QueryEmbeddingFailed
        }
        AppError::CorpusUnavailable(_) => FailureKind::CorpusUnavailable,
        _ => FailureKind::GenerationFailed,
    }
}

fn surface(error: AppError) -> RequestFailure {
    let failure = RequestFailure::new(failure_kind(&error));
    tracing::error!(kind = ?failure.kind, "Request failed: {}", error);
    failure
}

fn validate_query(query: &str) -> Result<&str, RequestFailure> {
    let query = query.trim();
    if query.is_empty() {
        tracing::warn!("Rejected empty query");
        return Err(RequestFailure::new(FailureKind::InvalidQuery));
    }
    Ok(query)
}

/// Customer-support question answering over a retrieved corpus.
pub struct SupportAgent {
    retriever: Retriever,
    generator: AnswerGenerator,
    suggester: FollowUpSuggester,
}

impl SupportAgent {
    pub fn new(
        retriever: Retriever,
        generator: AnswerGenerator,
        suggester: FollowUpSuggester,
    ) -> Self {
        Self {
            retriever,
            generator,
            suggester,
        }
    }

    /// Build every collaborator from configuration.
    ///
    /// Prompts come from the workspace when it overrides them.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let llm_key = config.resolve_api_key(&config.provider);
        let endpoint = config.endpoint_for(&config.provider);
        let client = create_client(
            &config.provider,
            endpoint.as_deref(),
            llm_key.as_deref(),
            timeout,
        )?;

        let retriever = Retriever::from_config(config)?;

        let settings = GenerationSettings::from_app_config(config);
        let generator = AnswerGenerator::with_prompt(
            Arc::clone(&client),
            load_prompt(&config.workspace, ANSWER_PROMPT_ID)?,
            settings.clone(),
        );
        let suggester = FollowUpSuggester::with_prompt(
            client,
            load_prompt(&config.workspace, FOLLOW_UP_PROMPT_ID)?,
            settings,
            config.follow_up_count,
        );

        tracing::debug!(
            "Support agent ready: generation={}/{}",
            config.provider,
            config.model
        );

        Ok(Self::new(retriever, generator, suggester))
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer a customer query with retrieved facts and follow-up suggestions.
    pub async fn handle_query(&self, query: &str) -> Result<QueryResponse, RequestFailure> {
        let span = tracing::info_span!("request", id = %Uuid::new_v4(), kind = "query");

        async move {
            let query = validate_query(query)?;
            tracing::info!("Handling query");

            let facts = self.retriever.retrieve(query).await.map_err(surface)?;
            tracing::info!("Retrieved {} facts", facts.len());

            let answer = self
                .generator
                .generate(query, &facts, FactsLabel::SupportInfo)
                .await
                .map_err(surface)?;

            let follow_up_suggestions = self.suggester.suggest(&answer).await;

            tracing::info!(
                "Query answered with {} follow-up suggestions",
                follow_up_suggestions.len()
            );

            Ok::<_, RequestFailure>(QueryResponse {
                query: query.to_string(),
                facts,
                answer,
                follow_up_suggestions,
            })
        }
        .instrument(span)
        .await
    }

    /// Answer a follow-up query. Same retrieval path, no suggestions.
    pub async fn handle_follow_up(
        &self,
        follow_up_query: &str,
    ) -> Result<FollowUpResponse, RequestFailure> {
        let span = tracing::info_span!("request", id = %Uuid::new_v4(), kind = "follow_up");

        async move {
            let query = validate_query(follow_up_query)?;
            tracing::info!("Handling follow-up query");

            let facts = self.retriever.retrieve(query).await.map_err(surface)?;
            tracing::info!("Retrieved {} facts", facts.len());

            let answer = self
                .generator
                .generate(query, &facts, FactsLabel::SupportContext)
                .await
                .map_err(surface)?;

            tracing::info!("Follow-up answered");

            Ok::<_, RequestFailure>(FollowUpResponse {
                follow_up_query: query.to_string(),
                facts,
                answer,
            })
        }
        .instrument(span)
        .await
    }
}
