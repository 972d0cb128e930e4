//! Ask command handler.
//!
//! Answers a customer question from the corpus and suggests follow-ups.

use crate::commands::{print_facts, print_json};
use clap::Args;
use support_core::{AppConfig, AppResult};
use support_knowledge::SupportAgent;

/// Ask a support question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The customer question
    pub query: String,

    /// Hide the retrieved facts
    #[arg(long)]
    pub no_facts: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let agent = SupportAgent::from_config(config)?;
        let response = match agent.handle_query(&self.query).await {
            Ok(response) => response,
            Err(failure) => {
                if self.json {
                    print_json(&failure.to_json())?;
                }
                return Err(failure.into());
            }
        };

        if self.json {
            return print_json(&response);
        }

        println!("{}", response.answer);

        if !self.no_facts {
            print_facts(&response.facts);
        }

        if !response.follow_up_suggestions.is_empty() {
            println!("\nYou might also ask:");
            for (i, suggestion) in response.follow_up_suggestions.iter().enumerate() {
                println!("  {}. {}", i + 1, suggestion);
            }
        }

        Ok(())
    }
}
