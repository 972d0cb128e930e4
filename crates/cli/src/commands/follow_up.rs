//! Follow-up command handler.

use crate::commands::{print_facts, print_json};
use clap::Args;
use support_core::{AppConfig, AppResult};
use support_knowledge::SupportAgent;

/// Ask a follow-up question (no further suggestions)
#[derive(Args, Debug)]
pub struct FollowUpCommand {
    /// The follow-up question
    pub query: String,

    /// Hide the retrieved facts
    #[arg(long)]
    pub no_facts: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FollowUpCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing follow-up command");

        let agent = SupportAgent::from_config(config)?;
        let response = match agent.handle_follow_up(&self.query).await {
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

        Ok(())
    }
}
