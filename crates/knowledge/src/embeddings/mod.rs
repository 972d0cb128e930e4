//! Embedding providers.
//!
//! Turns a text string into a fixed-length vector through an external
//! embedding service. Providers make exactly one outbound call per `embed`
//! and never retry; retry policy belongs to the caller.

pub mod cache;
pub mod config;
pub mod provider;
pub mod providers;

pub use cache::EmbeddingCache;
pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
