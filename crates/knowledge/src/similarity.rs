//! Cosine similarity and candidate selection.

use crate::types::ScoredCandidate;
use std::cmp::Ordering;

/// Cosine similarity of two vectors.
///
/// Returns 0.0 when either vector has zero magnitude or the dimensions differ,
/// so callers never see NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Keep candidates scoring at least `min_similarity`, best first, at most `top_k`.
///
/// Ties keep corpus order. The input order does not matter: candidates are
/// ordered by `(score desc, order asc)` after collection.
pub fn select(
    mut candidates: Vec<ScoredCandidate>,
    top_k: usize,
    min_similarity: f32,
) -> Vec<ScoredCandidate> {
    if top_k == 0 {
        return Vec::new();
    }

    candidates.retain(|c| c.score >= min_similarity);
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.order.cmp(&b.order))
    });
    candidates.truncate(top_k);
    candidates
}
