//! Knowledge and pipeline type definitions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use support_core::AppError;

/// A corpus document the units were segmented from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Display name (file path or in-memory label)
    pub name: String,

    /// SHA-256 of the document content, hex encoded
    pub digest: String,
}

/// A single retrievable line of the corpus.
///
/// Identity is the text plus the document it came from. Units are rebuilt on
/// every corpus load and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeUnit {
    /// Trimmed, non-empty line text
    pub text: String,

    /// Source document
    pub document: Arc<DocumentRef>,

    /// 1-based position among the document's kept lines
    pub position: usize,
}

/// A unit's text paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Fact text
    pub text: String,

    /// Cosine similarity to the query vector
    pub score: f32,

    /// Index of the unit in corpus order, used to break score ties
    pub order: usize,
}

/// Result of loading the corpus: whatever could be read plus what failed.
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    /// Units in corpus order
    pub units: Vec<KnowledgeUnit>,

    /// Documents that were read successfully
    pub documents: Vec<Arc<DocumentRef>>,

    /// Read failures, reported instead of raised
    pub errors: Vec<AppError>,
}

impl CorpusSnapshot {
    /// True when nothing could be read and at least one read failed.
    pub fn is_unavailable(&self) -> bool {
        self.units.is_empty() && !self.errors.is_empty()
    }
}

/// Which label introduces the facts in the augmented prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactsLabel {
    /// Used for a fresh customer query
    SupportInfo,

    /// Used for a follow-up query
    SupportContext,
}

impl FactsLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupportInfo => "Support Info",
            Self::SupportContext => "Support Context",
        }
    }
}

/// Answer to a customer query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub query: String,
    pub facts: Vec<String>,
    pub answer: String,
    pub follow_up_suggestions: Vec<String>,
}

/// Answer to a follow-up query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpResponse {
    pub follow_up_query: String,
    pub facts: Vec<String>,
    pub answer: String,
}

/// Why a request could not be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Query was empty or whitespace only
    InvalidQuery,

    /// The query could not be embedded
    QueryEmbeddingFailed,

    /// The corpus could not be read (strict mode only)
    CorpusUnavailable,

    /// The answer could not be generated
    GenerationFailed,
}

/// User-visible failure of a request.
///
/// Carries only the failure kind; provider messages and other internal
/// detail are logged where the failure happens and never reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("could not process request")]
pub struct RequestFailure {
    pub kind: FailureKind,
}

impl RequestFailure {
    /// Text shown to the user for every failure.
    pub const MESSAGE: &'static str = "could not process request";

    pub fn new(kind: FailureKind) -> Self {
        Self { kind }
    }

    /// JSON body for callers that answer over the wire.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": Self::MESSAGE,
            "kind": self.kind,
        })
    }
}

impl From<RequestFailure> for AppError {
    fn from(failure: RequestFailure) -> Self {
        AppError::Other(failure.to_string())
    }
}
