//! Prompt system for the support agent.
//!
//! This crate provides structured prompt management with:
//! - Built-in prompt definitions for answering and follow-up suggestions
//! - Workspace YAML overrides (`.support/prompts/<id>.yml`)
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{builtin_prompt, ANSWER_PROMPT_ID, FOLLOW_UP_PROMPT_ID};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
