//! In-memory embedding cache for corpus units.
//!
//! Entries are keyed by the digest of the document a unit came from plus the
//! unit text, so editing a document makes its old vectors unreachable. Call
//! [`EmbeddingCache::retain_digests`] after each corpus load to drop them.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

type CacheKey = (String, String);

/// Thread-safe map from (document digest, unit text) to vector.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<CacheKey, Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached vector.
    pub fn get(&self, digest: &str, text: &str) -> Option<Vec<f32>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(digest.to_string(), text.to_string()))
            .cloned()
    }

    /// Store a vector.
    pub fn insert(&self, digest: &str, text: &str, vector: Vec<f32>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((digest.to_string(), text.to_string()), vector);
    }

    /// Drop every entry whose digest is not in `digests`.
    ///
    /// Returns the number of entries removed.
    pub fn retain_digests<'a>(&self, digests: impl IntoIterator<Item = &'a str>) -> usize {
        let live: HashSet<&str> = digests.into_iter().collect();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(digest, _), _| live.contains(digest.as_str()));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
