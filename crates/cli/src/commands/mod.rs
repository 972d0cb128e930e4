//! Command handlers for the support CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod corpus;
pub mod follow_up;
pub mod retrieve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use corpus::CorpusCommand;
pub use follow_up::FollowUpCommand;
pub use retrieve::RetrieveCommand;

use support_core::{AppError, AppResult};

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Print facts as an indented list under a heading.
pub(crate) fn print_facts(facts: &[String]) {
    if facts.is_empty() {
        println!("\nNo matching support facts.");
        return;
    }

    println!("\nSupport facts:");
    for fact in facts {
        println!("  - {}", fact);
    }
}
