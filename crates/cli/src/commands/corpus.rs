//! Corpus command handler.
//!
//! Loads the corpus the same way retrieval does and reports what was found.

use crate::commands::print_json;
use clap::Args;
use std::collections::HashMap;
use support_core::{AppConfig, AppResult};
use support_knowledge::{FileSource, KnowledgeSource};

/// Inspect the support corpus
#[derive(Args, Debug)]
pub struct CorpusCommand {
    /// List every unit
    #[arg(short, long)]
    pub units: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing corpus command");

        let source = FileSource::new(config.corpus_path());
        let snapshot = source.load().await;

        let mut per_document: HashMap<&str, usize> = HashMap::new();
        for unit in &snapshot.units {
            *per_document.entry(unit.document.name.as_str()).or_insert(0) += 1;
        }

        if self.json {
            let documents: Vec<_> = snapshot
                .documents
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "name": d.name,
                        "digest": d.digest,
                        "units": per_document.get(d.name.as_str()).copied().unwrap_or(0),
                    })
                })
                .collect();
            let errors: Vec<_> = snapshot.errors.iter().map(|e| e.to_string()).collect();
            let mut output = serde_json::json!({
                "corpus": source.describe(),
                "documents": documents,
                "unitCount": snapshot.units.len(),
                "errors": errors,
            });
            if self.units {
                output["units"] = serde_json::json!(snapshot
                    .units
                    .iter()
                    .map(|u| &u.text)
                    .collect::<Vec<_>>());
            }
            return print_json(&output);
        }

        println!("Corpus: {}", source.describe());
        println!("Documents: {}", snapshot.documents.len());
        for document in &snapshot.documents {
            println!(
                "  {} ({} units, sha256 {})",
                document.name,
                per_document.get(document.name.as_str()).copied().unwrap_or(0),
                &document.digest[..12.min(document.digest.len())]
            );
        }
        println!("Units: {}", snapshot.units.len());

        if !snapshot.errors.is_empty() {
            println!("Errors:");
            for error in &snapshot.errors {
                println!("  {}", error);
            }
        }

        if self.units {
            println!();
            for unit in &snapshot.units {
                println!("{}:{}  {}", unit.document.name, unit.position, unit.text);
            }
        }

        Ok(())
    }
}
