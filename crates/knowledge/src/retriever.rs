//! Query-to-facts retrieval.
//!
//! Embeds the query, reloads the corpus, embeds every unit concurrently,
//! scores each against the query and keeps the best `top_k` above the
//! threshold. A unit whose embedding fails is skipped; a query whose
//! embedding fails fails the whole retrieval.

use crate::embeddings::{create_provider, EmbeddingCache, EmbeddingConfig, EmbeddingProvider};
use crate::similarity::{cosine_similarity, select};
use crate::source::{FileSource, KnowledgeSource};
use crate::types::{KnowledgeUnit, ScoredCandidate};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use support_core::{AppConfig, AppError, AppResult};

/// Tuning for a [`Retriever`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    /// Maximum number of facts returned
    pub top_k: usize,

    /// Minimum cosine similarity for a fact to be kept (inclusive)
    pub min_similarity: f32,

    /// Maximum in-flight unit embedding calls
    pub max_concurrency: usize,

    /// Fail with `CorpusUnavailable` when nothing could be read
    pub strict_corpus: bool,

    /// Timeout applied to every embedding call
    pub timeout: Duration,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_similarity: 0.6,
            max_concurrency: 16,
            strict_corpus: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetrievalOptions {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            min_similarity: config.retrieval.min_similarity,
            max_concurrency: config.retrieval.max_concurrency.max(1),
            strict_corpus: config.retrieval.strict_corpus,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Retrieves the facts most similar to a query.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    source: Arc<dyn KnowledgeSource>,
    options: RetrievalOptions,
    cache: Option<Arc<EmbeddingCache>>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        source: Arc<dyn KnowledgeSource>,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            embedder,
            source,
            options,
            cache: None,
        }
    }

    /// Retriever over the configured corpus file or directory, using the
    /// configured embedding provider.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedding_config = EmbeddingConfig::from_app_config(config);
        let api_key = config.resolve_api_key(&config.embedding_provider);
        let embedder = create_provider(&embedding_config, api_key.as_deref())?;

        let mut retriever = Self::new(
            embedder,
            Arc::new(FileSource::new(config.corpus_path())),
            RetrievalOptions::from_app_config(config),
        );
        if config.retrieval.cache_embeddings {
            retriever = retriever.with_cache(Arc::new(EmbeddingCache::new()));
        }

        tracing::debug!(
            "Retriever ready: embeddings={}/{}, corpus={}",
            embedding_config.provider,
            embedding_config.model,
            config.corpus_path().display()
        );

        Ok(retriever)
    }

    /// Reuse corpus vectors across calls while their document is unchanged.
    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Facts for `query` using the configured `top_k` and threshold.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<String>> {
        let candidates = self
            .retrieve_with(query, self.options.top_k, self.options.min_similarity)
            .await?;
        Ok(candidates.into_iter().map(|c| c.text).collect())
    }

    /// Scored facts for `query` with explicit limits.
    ///
    /// Errors are `QueryEmbeddingFailed`, or `CorpusUnavailable` when strict
    /// corpus mode is on and nothing could be read.
    pub async fn retrieve_with(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> AppResult<Vec<ScoredCandidate>> {
        if top_k == 0 {
            tracing::debug!("top_k is 0, skipping retrieval");
            return Ok(Vec::new());
        }

        let query_vector = self
            .embed(query)
            .await
            .map_err(|e| AppError::QueryEmbeddingFailed(e.to_string()))?;

        let snapshot = self.source.load().await;
        for error in &snapshot.errors {
            tracing::warn!("Corpus read error ({}): {}", self.source.describe(), error);
        }
        if self.options.strict_corpus && snapshot.is_unavailable() {
            return Err(AppError::CorpusUnavailable(format!(
                "no readable documents in {}",
                self.source.describe()
            )));
        }

        if let Some(cache) = &self.cache {
            let removed =
                cache.retain_digests(snapshot.documents.iter().map(|d| d.digest.as_str()));
            if removed > 0 {
                tracing::debug!("Dropped {} stale cached embeddings", removed);
            }
        }

        let candidates = self.rank(&query_vector, &snapshot.units).await;
        let scored = candidates.len();
        let selected = select(candidates, top_k, min_similarity);

        tracing::debug!(
            "Scored {}/{} units, selected {} (top_k={}, min_similarity={})",
            scored,
            snapshot.units.len(),
            selected.len(),
            top_k,
            min_similarity
        );
        for candidate in &selected {
            tracing::debug!("  {:.4} {}", candidate.score, candidate.text);
        }

        Ok(selected)
    }

    /// Embed and score every unit against the query vector.
    ///
    /// Units that fail to embed are left out. The returned order follows
    /// completion; callers sort.
    pub async fn rank(&self, query_vector: &[f32], units: &[KnowledgeUnit]) -> Vec<ScoredCandidate> {
        let concurrency = self.options.max_concurrency.max(1);

        let results: Vec<Option<ScoredCandidate>> = stream::iter(units.iter().enumerate())
            .map(|(order, unit)| self.score_unit(query_vector, order, unit))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let skipped = results.iter().filter(|r| r.is_none()).count();
        if skipped > 0 {
            tracing::warn!("Skipped {} of {} units that failed to embed", skipped, units.len());
        }

        results.into_iter().flatten().collect()
    }

    async fn score_unit(
        &self,
        query_vector: &[f32],
        order: usize,
        unit: &KnowledgeUnit,
    ) -> Option<ScoredCandidate> {
        let vector = match self.unit_vector(unit).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(
                    "Skipping {}:{}: {}",
                    unit.document.name,
                    unit.position,
                    e
                );
                return None;
            }
        };

        if vector.len() != query_vector.len() {
            tracing::warn!(
                "Dimension mismatch for {}:{} ({} vs query {}), scoring 0",
                unit.document.name,
                unit.position,
                vector.len(),
                query_vector.len()
            );
        }

        Some(ScoredCandidate {
            text: unit.text.clone(),
            score: cosine_similarity(query_vector, &vector),
            order,
        })
    }

    async fn unit_vector(&self, unit: &KnowledgeUnit) -> AppResult<Vec<f32>> {
        let Some(cache) = &self.cache else {
            return self.embed(&unit.text).await;
        };

        if let Some(vector) = cache.get(&unit.document.digest, &unit.text) {
            return Ok(vector);
        }

        let vector = self.embed(&unit.text).await?;
        cache.insert(&unit.document.digest, &unit.text, vector.clone());
        Ok(vector)
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        match tokio::time::timeout(self.options.timeout, self.embedder.embed(text)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::EmbeddingUnavailable(format!(
                "embedding timed out after {:?}",
                self.options.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_configured_provider_and_limits() {
        let mut config = AppConfig::default();
        config.embedding_provider = "mock".to_string();
        config.embedding_dimensions = Some(64);
        config.retrieval.top_k = 5;
        config.retrieval.strict_corpus = true;

        let retriever = Retriever::from_config(&config).unwrap();
        assert_eq!(retriever.embedder().provider_name(), "mock");
        assert_eq!(retriever.embedder().dimensions(), Some(64));
        assert_eq!(retriever.options().top_k, 5);
        assert!(retriever.options().strict_corpus);
        assert!(retriever.cache.is_none());

        config.retrieval.cache_embeddings = true;
        assert!(Retriever::from_config(&config).unwrap().cache.is_some());
    }

    #[test]
    fn test_from_config_unknown_embedding_provider() {
        let mut config = AppConfig::default();
        config.embedding_provider = "word2vec".to_string();
        assert!(Retriever::from_config(&config).is_err());
    }
}
