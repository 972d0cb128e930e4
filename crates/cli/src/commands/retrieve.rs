//! Retrieve command handler.
//!
//! Runs retrieval only, without calling the language model. Useful for
//! tuning `topK` and the similarity threshold against a corpus.

use crate::commands::print_json;
use clap::Args;
use support_core::{AppConfig, AppError, AppResult};
use support_knowledge::{FailureKind, RequestFailure, Retriever};

/// Show the facts retrieved for a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// The query to retrieve facts for
    pub query: String,

    /// Maximum number of facts (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Minimum similarity (default: retrieval.minSimilarity)
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Show similarity scores
    #[arg(long)]
    pub scores: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");
        tracing::debug!("Retrieve options: {:?}", self);

        let retriever = Retriever::from_config(config)?;

        let top_k = self.top_k.unwrap_or(config.retrieval.top_k);
        let threshold = self.threshold.unwrap_or(config.retrieval.min_similarity);

        let query = self.query.trim();
        if query.is_empty() {
            return Err(RequestFailure::new(FailureKind::InvalidQuery).into());
        }

        let candidates = retriever
            .retrieve_with(query, top_k, threshold)
            .await
            .map_err(|e| {
                tracing::error!("Retrieval failed: {}", e);
                let kind = match e {
                    AppError::CorpusUnavailable(_) => FailureKind::CorpusUnavailable,
                    _ => FailureKind::QueryEmbeddingFailed,
                };
                AppError::from(RequestFailure::new(kind))
            })?;

        if self.json {
            let facts: Vec<_> = candidates
                .iter()
                .map(|c| {
                    if self.scores {
                        serde_json::json!({ "fact": c.text, "score": c.score })
                    } else {
                        serde_json::json!(c.text)
                    }
                })
                .collect();
            return print_json(&serde_json::json!({ "query": query, "facts": facts }));
        }

        if candidates.is_empty() {
            println!(
                "No facts at or above similarity {:.2} for: {}",
                threshold, query
            );
            return Ok(());
        }

        for candidate in &candidates {
            if self.scores {
                println!("{:.4}  {}", candidate.score, candidate.text);
            } else {
                println!("{}", candidate.text);
            }
        }

        Ok(())
    }
}
