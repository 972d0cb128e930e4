//! Corpus loading and segmentation.
//!
//! A source reads raw documents and splits them into [`KnowledgeUnit`]s, one
//! per non-empty trimmed line. Read failures are collected in the snapshot
//! instead of being raised, so retrieval degrades to fewer (or zero) facts.

use crate::types::{CorpusSnapshot, DocumentRef, KnowledgeUnit};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use support_core::AppError;
use walkdir::WalkDir;

/// File extensions picked up when the corpus is a directory.
const CORPUS_EXTENSIONS: &[&str] = &["txt", "md"];

/// Provider of the support corpus.
///
/// Loaded fresh on every retrieval.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    async fn load(&self) -> CorpusSnapshot;
}

/// Hex-encoded SHA-256 of a document's content.
pub fn digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Split a document into units: one per line, trimmed, empties dropped.
pub fn segment(document: Arc<DocumentRef>, content: &str) -> Vec<KnowledgeUnit> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| KnowledgeUnit {
            text: line.to_string(),
            document: Arc::clone(&document),
            position: i + 1,
        })
        .collect()
}

fn add_document(snapshot: &mut CorpusSnapshot, name: String, content: &str) {
    let document = Arc::new(DocumentRef {
        name,
        digest: digest(content),
    });
    snapshot
        .units
        .extend(segment(Arc::clone(&document), content));
    snapshot.documents.push(document);
}

/// Corpus backed by a file, or a directory of `.txt`/`.md` files.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Walk the corpus path. Blocking; run off the async runtime.
    ///
    /// Returns the corpus files in sorted path order plus one error per
    /// entry that could not be visited. A failed entry never hides the
    /// readable ones.
    fn discover(root: &Path) -> (Vec<PathBuf>, Vec<AppError>) {
        if !root.is_dir() {
            return (vec![root.to_path_buf()], Vec::new());
        }

        let mut paths = Vec::new();
        let mut errors = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(AppError::CorpusUnavailable(format!(
                        "Failed to walk {}: {}",
                        root.display(),
                        e
                    )));
                    continue;
                }
            };

            let is_corpus_file = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| CORPUS_EXTENSIONS.contains(&ext));

            if is_corpus_file {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        (paths, errors)
    }

    async fn document_paths(&self) -> (Vec<PathBuf>, Vec<AppError>) {
        let root = self.path.clone();
        match tokio::task::spawn_blocking(move || Self::discover(&root)).await {
            Ok(found) => found,
            Err(e) => (
                Vec::new(),
                vec![AppError::CorpusUnavailable(format!(
                    "Corpus scan of {} aborted: {}",
                    self.path.display(),
                    e
                ))],
            ),
        }
    }
}

#[async_trait]
impl KnowledgeSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> CorpusSnapshot {
        let mut snapshot = CorpusSnapshot::default();

        let (paths, walk_errors) = self.document_paths().await;
        for error in &walk_errors {
            tracing::warn!("{}", error);
        }
        snapshot.errors.extend(walk_errors);

        for path in paths {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => add_document(&mut snapshot, path.display().to_string(), &content),
                Err(e) => {
                    tracing::warn!("Failed to read corpus file {}: {}", path.display(), e);
                    snapshot.errors.push(AppError::CorpusUnavailable(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        tracing::debug!(
            "Loaded {} units from {} documents ({} errors)",
            snapshot.units.len(),
            snapshot.documents.len(),
            snapshot.errors.len()
        );

        snapshot
    }
}

/// Corpus held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<(String, String)>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named document.
    pub fn with_document(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push((name.into(), content.into()));
        self
    }

    /// Single document made of the given lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let content = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new().with_document("inline", content)
    }
}

#[async_trait]
impl KnowledgeSource for StaticSource {
    fn describe(&self) -> String {
        format!("{} in-memory documents", self.documents.len())
    }

    async fn load(&self) -> CorpusSnapshot {
        let mut snapshot = CorpusSnapshot::default();
        for (name, content) in &self.documents {
            add_document(&mut snapshot, name.clone(), content);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc() -> Arc<DocumentRef> {
        Arc::new(DocumentRef {
            name: "faq".to_string(),
            digest: digest(""),
        })
    }

    #[test]
    fn test_segment_trims_and_drops_empty_lines() {
        let units = segment(
            doc(),
            "  Refunds take 5 days.  \n\n\n\tShipping is free over $50.\r\n   \nContact support at help@example.com.",
        );

        let texts: Vec<_> = units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Refunds take 5 days.",
                "Shipping is free over $50.",
                "Contact support at help@example.com."
            ]
        );
        let positions: Vec<_> = units.iter().map(|u| u.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_segment_empty_document() {
        assert!(segment(doc(), "").is_empty());
        assert!(segment(doc(), "\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_digest_changes_with_content() {
        assert_eq!(digest("a"), digest("a"));
        assert_ne!(digest("a"), digest("b"));
        assert_eq!(digest("a").len(), 64);
    }

    #[tokio::test]
    async fn test_file_source_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faq.txt");
        std::fs::write(&path, "Refunds take 5 days.\n\nWe ship worldwide.\n").unwrap();

        let snapshot = FileSource::new(&path).load().await;
        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.documents.len(), 1);
        assert!(snapshot.errors.is_empty());
    }

    #[tokio::test]
    async fn test_file_source_missing_file_reports_error() {
        let dir = TempDir::new().unwrap();
        let snapshot = FileSource::new(dir.path().join("missing.txt")).load().await;

        assert!(snapshot.units.is_empty());
        assert_eq!(snapshot.errors.len(), 1);
        assert!(snapshot.is_unavailable());
        assert!(matches!(snapshot.errors[0], AppError::CorpusUnavailable(_)));
    }

    #[tokio::test]
    async fn test_file_source_directory_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b_shipping.md"), "We ship worldwide.").unwrap();
        std::fs::write(dir.path().join("a_refunds.txt"), "Refunds take 5 days.").unwrap();
        std::fs::write(dir.path().join("notes.json"), "{\"ignored\": true}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.txt"), "Call us anytime.").unwrap();

        let snapshot = FileSource::new(dir.path()).load().await;
        let texts: Vec<_> = snapshot.units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Refunds take 5 days.", "We ship worldwide.", "Call us anytime."]
        );
        assert_eq!(snapshot.documents.len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_source_unreadable_subdirectory_keeps_other_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a_refunds.txt"), "Refunds take 5 days.").unwrap();
        let locked = dir.path().join("b_locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("hidden.txt"), "Hidden fact.").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory.
        let locked_out = std::fs::read_dir(&locked).is_err();

        let snapshot = FileSource::new(dir.path()).load().await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(snapshot.units[0].text, "Refunds take 5 days.");
        assert!(!snapshot.is_unavailable());
        if locked_out {
            assert_eq!(snapshot.units.len(), 1);
            assert_eq!(snapshot.documents.len(), 1);
            assert_eq!(snapshot.errors.len(), 1);
            assert!(matches!(snapshot.errors[0], AppError::CorpusUnavailable(_)));
        }
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::from_lines(["One.", "", "Two."]);
        let snapshot = source.load().await;

        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.units[1].text, "Two.");
        assert_eq!(snapshot.units[1].document.name, "inline");
    }
}
