//! Retrieval ranking, filtering and partial-failure behaviour.

use super::fakes::ScriptedEmbedder;
use crate::embeddings::EmbeddingCache;
use crate::retriever::{RetrievalOptions, Retriever};
use crate::similarity::cosine_similarity;
use crate::source::{FileSource, StaticSource};
use std::sync::Arc;
use std::time::Duration;
use support_core::AppError;
use tempfile::TempDir;

const REFUND: &str = "Refunds take 5 days.";
const SHIPPING: &str = "Shipping is free over $50.";
const CONTACT: &str = "Contact support at help@example.com.";
const QUERY: &str = "How long does a refund take?";

fn faq_embedder() -> ScriptedEmbedder {
    ScriptedEmbedder::new()
        .with(QUERY, vec![1.0, 0.0, 0.0])
        .with(REFUND, vec![0.9, 0.1, 0.0])
        .with(SHIPPING, vec![0.1, 0.9, 0.2])
        .with(CONTACT, vec![0.0, 0.2, 0.9])
}

fn faq_source() -> StaticSource {
    StaticSource::from_lines([REFUND, SHIPPING, CONTACT])
}

fn retriever(embedder: Arc<ScriptedEmbedder>, source: StaticSource) -> Retriever {
    Retriever::new(embedder, Arc::new(source), RetrievalOptions::default())
}

#[tokio::test]
async fn test_refund_query_returns_refund_fact() {
    let embedder = Arc::new(faq_embedder());
    let retriever = retriever(embedder.clone(), faq_source());

    let facts = retriever.retrieve_with(QUERY, 1, 0.6).await.unwrap();
    let texts: Vec<_> = facts.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec![REFUND]);

    // Query plus one call per sentence.
    assert_eq!(embedder.calls(), 4);
}

#[tokio::test]
async fn test_result_bounded_by_top_k_and_threshold() {
    let lines: Vec<String> = (0..10).map(|i| format!("Fact number {}.", i)).collect();
    let mut embedder = ScriptedEmbedder::new().with("query", vec![1.0, 0.0]);
    for (i, line) in lines.iter().enumerate() {
        let angle = i as f32 * 0.15;
        embedder = embedder.with(line, vec![angle.cos(), angle.sin()]);
    }
    let embedder = Arc::new(embedder);
    let retriever = retriever(embedder, StaticSource::from_lines(&lines));

    for (top_k, threshold) in [(1, 0.0), (3, 0.6), (5, 0.9), (10, 0.99), (20, -1.0)] {
        let selected = retriever.retrieve_with("query", top_k, threshold).await.unwrap();

        assert!(selected.len() <= top_k);
        assert!(selected.iter().all(|c| c.score >= threshold));
        assert!(selected.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[tokio::test]
async fn test_ties_keep_corpus_order_regardless_of_completion() {
    // Earlier lines finish last.
    let embedder = Arc::new(
        ScriptedEmbedder::new()
            .with("q", vec![1.0, 0.0])
            .with("A first.", vec![1.0, 0.0])
            .with("B second.", vec![1.0, 0.0])
            .with("C third.", vec![1.0, 0.0])
            .delayed("A first.", Duration::from_millis(60))
            .delayed("B second.", Duration::from_millis(30)),
    );
    let retriever = retriever(
        embedder,
        StaticSource::from_lines(["A first.", "B second.", "C third."]),
    );

    let facts = retriever.retrieve_with("q", 3, 0.5).await.unwrap();
    let texts: Vec<_> = facts.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["A first.", "B second.", "C third."]);
}

#[tokio::test]
async fn test_query_embedding_failure_is_fatal_and_skips_corpus() {
    let embedder = Arc::new(faq_embedder().failing(QUERY));
    let retriever = retriever(embedder.clone(), faq_source());

    let result = retriever.retrieve(QUERY).await;
    assert!(matches!(result, Err(AppError::QueryEmbeddingFailed(_))));
    assert_eq!(embedder.calls(), 1);
    assert_eq!(embedder.seen(), vec![QUERY.to_string()]);
}

#[tokio::test]
async fn test_single_unit_failure_is_skipped() {
    let embedder = Arc::new(faq_embedder().failing(REFUND));
    let retriever = retriever(embedder.clone(), faq_source());

    let facts = retriever.retrieve_with(QUERY, 3, -1.0).await.unwrap();
    let texts: Vec<_> = facts.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert!(!texts.contains(&REFUND));
    assert_eq!(embedder.calls(), 4);
}

#[tokio::test]
async fn test_empty_corpus_returns_no_facts() {
    let embedder = Arc::new(faq_embedder());
    let retriever = retriever(embedder, StaticSource::new().with_document("empty", "\n\n"));

    assert!(retriever.retrieve(QUERY).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_top_k_makes_no_calls() {
    let embedder = Arc::new(faq_embedder());
    let retriever = retriever(embedder.clone(), faq_source());

    assert!(retriever.retrieve_with(QUERY, 0, 0.6).await.unwrap().is_empty());
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_nothing_above_threshold() {
    let embedder = Arc::new(faq_embedder());
    let retriever = retriever(embedder, faq_source());

    assert!(retriever.retrieve_with(QUERY, 3, 0.999).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dimension_mismatch_scores_zero() {
    let embedder = Arc::new(
        ScriptedEmbedder::new()
            .with("q", vec![1.0, 0.0])
            .with("Wrong size.", vec![1.0, 0.0, 0.0])
            .with("Right size.", vec![0.8, 0.6]),
    );
    let retriever = retriever(
        embedder,
        StaticSource::from_lines(["Wrong size.", "Right size."]),
    );

    let facts = retriever.retrieve_with("q", 3, -1.0).await.unwrap();
    assert_eq!(facts[0].text, "Right size.");
    assert_eq!(facts[1].text, "Wrong size.");
    assert_eq!(facts[1].score, 0.0);

    let positive = retriever.retrieve_with("q", 3, 0.1).await.unwrap();
    assert_eq!(positive.len(), 1);
}

#[tokio::test]
async fn test_missing_corpus_degrades_to_no_facts() {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(faq_embedder());
    let retriever = Retriever::new(
        embedder.clone(),
        Arc::new(FileSource::new(dir.path().join("missing.txt"))),
        RetrievalOptions::default(),
    );

    assert!(retriever.retrieve(QUERY).await.unwrap().is_empty());
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn test_missing_corpus_fails_in_strict_mode() {
    let dir = TempDir::new().unwrap();
    let retriever = Retriever::new(
        Arc::new(faq_embedder()),
        Arc::new(FileSource::new(dir.path().join("missing.txt"))),
        RetrievalOptions {
            strict_corpus: true,
            ..Default::default()
        },
    );

    let result = retriever.retrieve(QUERY).await;
    assert!(matches!(result, Err(AppError::CorpusUnavailable(_))));
}

#[tokio::test]
async fn test_corpus_reread_on_every_call() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("faq.txt");
    std::fs::write(&path, SHIPPING).unwrap();

    let retriever = Retriever::new(
        Arc::new(faq_embedder()),
        Arc::new(FileSource::new(&path)),
        RetrievalOptions::default(),
    );
    assert!(retriever.retrieve(QUERY).await.unwrap().is_empty());

    std::fs::write(&path, format!("{}\n{}", SHIPPING, REFUND)).unwrap();
    assert_eq!(retriever.retrieve(QUERY).await.unwrap(), vec![REFUND.to_string()]);
}

#[tokio::test]
async fn test_unit_timeout_is_skipped() {
    let embedder = Arc::new(faq_embedder().delayed(SHIPPING, Duration::from_millis(500)));
    let retriever = Retriever::new(
        embedder,
        Arc::new(faq_source()),
        RetrievalOptions {
            timeout: Duration::from_millis(50),
            ..Default::default()
        },
    );

    let facts = retriever.retrieve_with(QUERY, 3, -1.0).await.unwrap();
    let texts: Vec<_> = facts.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec![REFUND, CONTACT]);
}

#[tokio::test]
async fn test_cache_reuses_vectors_until_document_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("faq.txt");
    std::fs::write(&path, format!("{}\n{}", REFUND, SHIPPING)).unwrap();

    let embedder = Arc::new(faq_embedder());
    let cache = Arc::new(EmbeddingCache::new());
    let retriever = Retriever::new(
        embedder.clone(),
        Arc::new(FileSource::new(&path)),
        RetrievalOptions::default(),
    )
    .with_cache(cache.clone());

    retriever.retrieve(QUERY).await.unwrap();
    assert_eq!(embedder.calls(), 3);
    assert_eq!(cache.len(), 2);

    // Only the query is embedded again.
    retriever.retrieve(QUERY).await.unwrap();
    assert_eq!(embedder.calls(), 4);

    // New digest: old entries dropped, every line embedded again.
    std::fs::write(&path, format!("{}\n{}\n{}", REFUND, SHIPPING, CONTACT)).unwrap();
    retriever.retrieve(QUERY).await.unwrap();
    assert_eq!(embedder.calls(), 8);
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_fixture_vectors_rank_refund_first() {
    let query = [1.0, 0.0, 0.0];
    let refund = cosine_similarity(&query, &[0.9, 0.1, 0.0]);
    let shipping = cosine_similarity(&query, &[0.1, 0.9, 0.2]);
    assert!(refund > 0.6);
    assert!(shipping < 0.6);
}
