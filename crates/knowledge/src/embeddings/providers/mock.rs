//! Offline embedding provider.
//!
//! Hashes word trigrams into a fixed number of buckets. Deterministic and
//! content-dependent, good enough for local runs and tests without a network.

use crate::embeddings::provider::EmbeddingProvider;
use std::collections::BTreeMap;
use support_core::AppResult;

/// Words too common to discriminate between support facts.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of", "in",
    "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had", "it",
    "its", "do", "does", "you", "your", "how", "what", "can",
];

/// Deterministic embedder that needs no external service.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(seed).wrapping_add(u64::from(b)));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w))
        {
            *counts.entry(word).or_insert(0) += 1;
        }

        for (word, count) in counts {
            let weight = count as f32;
            vector[self.bucket(word, 31)] += weight;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram, 37)] += weight.sqrt();
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[tokio::test]
    async fn test_unit_length() {
        let provider = MockEmbedder::new(384);
        let embedding = provider.embed("Refunds take 5 days.").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = MockEmbedder::new(128);
        let first = provider.embed("We ship worldwide.").await.unwrap();
        let second = provider.embed("We ship worldwide.").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let provider = MockEmbedder::new(384);
        let query = provider.embed("How long does a refund take?").await.unwrap();
        let refund = provider.embed("Refunds take 5 days.").await.unwrap();
        let shipping = provider.embed("We ship worldwide.").await.unwrap();

        assert!(cosine_similarity(&query, &refund) > cosine_similarity(&query, &shipping));
    }

    #[tokio::test]
    async fn test_stop_words_only_is_zero_vector() {
        let provider = MockEmbedder::new(16);
        let embedding = provider.embed("the and of").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let provider = MockEmbedder::new(64);
        let embedding = provider.embed("Reembolsos em 5 dias úteis 🎮").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
