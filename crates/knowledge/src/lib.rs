//! Retrieval-augmented customer support.
//!
//! Answers customer questions from a small line-oriented corpus: the query
//! and every corpus line are embedded, lines are ranked by cosine similarity,
//! and the best ones are handed to a language model together with the query.
//! The corpus is re-read and re-embedded on every request unless the optional
//! [`EmbeddingCache`] is enabled.

pub mod agent;
pub mod embeddings;
pub mod followup;
pub mod generator;
pub mod retriever;
pub mod similarity;
pub mod source;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use agent::SupportAgent;
pub use embeddings::{create_provider, EmbeddingCache, EmbeddingConfig, EmbeddingProvider};
pub use followup::{parse_suggestions, FollowUpSuggester};
pub use generator::{AnswerGenerator, GenerationSettings};
pub use retriever::{RetrievalOptions, Retriever};
pub use similarity::{cosine_similarity, select};
pub use source::{segment, FileSource, KnowledgeSource, StaticSource};
pub use types::{
    CorpusSnapshot, DocumentRef, FactsLabel, FailureKind, FollowUpResponse, KnowledgeUnit,
    QueryResponse, RequestFailure, ScoredCandidate,
};
