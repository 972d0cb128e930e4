//! Follow-up question suggestions.

use crate::generator::{builtin, complete, GenerationSettings};
use std::collections::HashMap;
use std::sync::Arc;
use support_core::{AppError, AppResult};
use support_llm::LlmClient;
use support_prompt::{build_prompt, BuiltPrompt, PromptDefinition, FOLLOW_UP_PROMPT_ID};

const ANSWER_DELIMITER: &str = "\"\"\"";
const ESCAPED_DELIMITER: &str = "'''";

/// Parse a model's free-form list into clean suggestions.
///
/// Each line is trimmed, stripped of leading list markers (digits, dots,
/// dashes, asterisks) and trimmed again; empty lines are dropped and at most
/// `max` lines are kept.
pub fn parse_suggestions(raw: &str, max: usize) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '*'))
                .trim()
        })
        .filter(|line| !line.is_empty())
        .take(max)
        .map(String::from)
        .collect()
}

/// Asks the model for questions a customer might ask next.
pub struct FollowUpSuggester {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: GenerationSettings,
    count: usize,
}

impl FollowUpSuggester {
    /// Suggester using the built-in follow-up prompt.
    pub fn new(
        client: Arc<dyn LlmClient>,
        settings: GenerationSettings,
        count: usize,
    ) -> AppResult<Self> {
        Ok(Self::with_prompt(
            client,
            builtin(FOLLOW_UP_PROMPT_ID)?,
            settings,
            count,
        ))
    }

    pub fn with_prompt(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: GenerationSettings,
        count: usize,
    ) -> Self {
        Self {
            client,
            prompt,
            settings,
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Render the follow-up prompt around `answer`.
    ///
    /// Triple quotes inside the answer are rewritten so the answer cannot
    /// close its block early.
    pub fn build_prompt(&self, answer: &str) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("count".to_string(), self.count.to_string());
        variables.insert(
            "answer".to_string(),
            answer.replace(ANSWER_DELIMITER, ESCAPED_DELIMITER),
        );
        build_prompt(&self.prompt, variables)
    }

    /// Suggestions for `answer`, or an empty list if anything fails.
    pub async fn suggest(&self, answer: &str) -> Vec<String> {
        match self.try_suggest(answer).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!("Follow-up suggestions unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Suggestions for `answer`; failures are `FollowUpGenerationFailed`.
    pub async fn try_suggest(&self, answer: &str) -> AppResult<Vec<String>> {
        if self.count == 0 {
            return Ok(Vec::new());
        }

        let prompt = self
            .build_prompt(answer)
            .map_err(|e| AppError::FollowUpGenerationFailed(e.to_string()))?;

        let raw = complete(self.client.as_ref(), &self.settings, &prompt)
            .await
            .map_err(|e| AppError::FollowUpGenerationFailed(e.to_string()))?;

        let suggestions = parse_suggestions(&raw, self.count);
        tracing::debug!("Parsed {} follow-up suggestions", suggestions.len());
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbered_list_keeps_first_two() {
        let raw = "1. How do I request a refund?\n2. What is the refund policy for international orders?\nExtra unrelated line";
        assert_eq!(
            parse_suggestions(raw, 2),
            vec![
                "How do I request a refund?",
                "What is the refund policy for international orders?"
            ]
        );
    }

    #[test]
    fn test_parse_strips_bullets_and_blank_lines() {
        let raw = "\n  - Can I change my address?\n\n* Do you ship abroad?  \n";
        assert_eq!(
            parse_suggestions(raw, 5),
            vec!["Can I change my address?", "Do you ship abroad?"]
        );
    }

    #[test]
    fn test_parse_drops_marker_only_lines() {
        assert_eq!(parse_suggestions("1.\n--\n3. Real question?", 2), vec!["Real question?"]);
    }

    #[test]
    fn test_parse_zero_max() {
        assert!(parse_suggestions("1. Anything?", 0).is_empty());
    }

    #[test]
    fn test_parse_crlf() {
        assert_eq!(
            parse_suggestions("1. First?\r\n2. Second?\r\n", 2),
            vec!["First?", "Second?"]
        );
    }
}
