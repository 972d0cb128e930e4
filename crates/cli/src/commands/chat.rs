//! Interactive chat command.
//!
//! Keeps the conversation in memory as [`ConversationTurn`]s. Typing the
//! number of a suggestion from the last answer asks it as a follow-up.

use clap::Args;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use support_core::{AppConfig, AppResult};
use support_knowledge::{RequestFailure, SupportAgent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Chat with the support agent
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Write the conversation as JSON to this file on exit
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Hide the retrieved facts
    #[arg(long)]
    pub no_facts: bool,
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

/// One exchange in the conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub sender: Sender,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            facts: Vec::new(),
            suggestions: Vec::new(),
            at: Utc::now(),
        }
    }

    fn system(content: impl Into<String>, facts: Vec<String>, suggestions: Vec<String>) -> Self {
        Self {
            sender: Sender::System,
            content: content.into(),
            facts,
            suggestions,
            at: Utc::now(),
        }
    }

    /// The reply recorded when a request could not be answered.
    fn failure() -> Self {
        Self::system(RequestFailure::MESSAGE, Vec::new(), Vec::new())
    }
}

/// What a line of user input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    History,
    Skip,
    Query(&'a str),
    FollowUp(String),
}

/// Interpret a line against the suggestions of the last answer.
fn interpret<'a>(line: &'a str, suggestions: &[String]) -> Input<'a> {
    let line = line.trim();
    match line {
        "" => Input::Skip,
        "/quit" | "/exit" | "quit" | "exit" => Input::Quit,
        "/history" => Input::History,
        _ => match line.parse::<usize>() {
            Ok(n) if n >= 1 && n <= suggestions.len() => {
                Input::FollowUp(suggestions[n - 1].clone())
            }
            _ => Input::Query(line),
        },
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let agent = SupportAgent::from_config(config)?;
        let mut history: Vec<ConversationTurn> = Vec::new();
        let mut suggestions: Vec<String> = Vec::new();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        println!("Ask a support question. Enter a suggestion number to follow up, /history to review, /quit to leave.");

        loop {
            stdout.write_all(b"\n> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match interpret(&line, &suggestions) {
                Input::Skip => continue,
                Input::Quit => break,
                Input::History => self.print_history(&history),
                Input::Query(query) => {
                    history.push(ConversationTurn::user(query));
                    match agent.handle_query(query).await {
                        Ok(response) => {
                            self.print_answer(
                                &response.answer,
                                &response.facts,
                                &response.follow_up_suggestions,
                            );
                            suggestions = response.follow_up_suggestions.clone();
                            history.push(ConversationTurn::system(
                                response.answer,
                                response.facts,
                                response.follow_up_suggestions,
                            ));
                        }
                        Err(failure) => {
                            eprintln!("{}", failure);
                            history.push(ConversationTurn::failure());
                            suggestions.clear();
                        }
                    }
                }
                Input::FollowUp(question) => {
                    println!("Follow-up: {}", question);
                    history.push(ConversationTurn::user(question.as_str()));
                    match agent.handle_follow_up(&question).await {
                        Ok(response) => {
                            self.print_answer(&response.answer, &response.facts, &[]);
                            history.push(ConversationTurn::system(
                                response.answer,
                                response.facts,
                                Vec::new(),
                            ));
                        }
                        Err(failure) => {
                            eprintln!("{}", failure);
                            history.push(ConversationTurn::failure());
                        }
                    }
                    suggestions.clear();
                }
            }
        }

        if let Some(path) = &self.transcript {
            let json = serde_json::to_string_pretty(&history)?;
            tokio::fs::write(path, json).await?;
            tracing::info!("Wrote {} turns to {}", history.len(), path.display());
        }

        Ok(())
    }

    fn print_answer(&self, answer: &str, facts: &[String], suggestions: &[String]) {
        println!("\n{}", answer);

        if !self.no_facts && !facts.is_empty() {
            println!("\nBased on:");
            for fact in facts {
                println!("  - {}", fact);
            }
        }

        if !suggestions.is_empty() {
            println!("\nFollow-up:");
            for (i, suggestion) in suggestions.iter().enumerate() {
                println!("  [{}] {}", i + 1, suggestion);
            }
        }
    }

    fn print_history(&self, history: &[ConversationTurn]) {
        if history.is_empty() {
            println!("No conversation yet.");
            return;
        }

        for turn in history {
            let who = match turn.sender {
                Sender::User => "you",
                Sender::System => "support",
            };
            println!("[{}] {}: {}", turn.at.format("%H:%M:%S"), who, turn.content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_suggestion_number() {
        let suggestions = vec!["How do I request a refund?".to_string()];
        assert_eq!(
            interpret(" 1 ", &suggestions),
            Input::FollowUp("How do I request a refund?".to_string())
        );
        assert_eq!(interpret("2", &suggestions), Input::Query("2"));
        assert_eq!(interpret("0", &suggestions), Input::Query("0"));
    }

    #[test]
    fn test_interpret_commands() {
        assert_eq!(interpret("   ", &[]), Input::Skip);
        assert_eq!(interpret("/quit", &[]), Input::Quit);
        assert_eq!(interpret("exit", &[]), Input::Quit);
        assert_eq!(interpret("/history", &[]), Input::History);
        assert_eq!(
            interpret("Do you ship abroad?", &[]),
            Input::Query("Do you ship abroad?")
        );
    }

    #[test]
    fn test_turn_serialization() {
        let turn = ConversationTurn::system(
            "About five days.",
            vec!["Refunds take 5 days.".to_string()],
            Vec::new(),
        );
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["sender"], "system");
        assert_eq!(json["facts"][0], "Refunds take 5 days.");
        assert!(json.get("suggestions").is_none());
        assert!(json["at"].is_string());
    }

    #[test]
    fn test_failed_request_is_answered_in_history() {
        let mut history = vec![ConversationTurn::user("Where is my order?")];
        history.push(ConversationTurn::failure());

        let last = history.last().unwrap();
        assert!(matches!(last.sender, Sender::System));
        assert_eq!(last.content, "could not process request");
        assert!(last.facts.is_empty());

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json[0]["sender"], "user");
        assert_eq!(json[1]["sender"], "system");
        assert_eq!(json[1]["content"], "could not process request");
    }
}
