//! Built-in prompt definitions.
//!
//! These ship with the binary so the agent works without any workspace
//! prompt files. A workspace can replace either one with a YAML file of the
//! same id.

use crate::types::PromptDefinition;

/// Prompt that combines the customer question with retrieved facts.
pub const ANSWER_PROMPT_ID: &str = "support.answer";

/// Prompt that asks for follow-up questions about a generated answer.
pub const FOLLOW_UP_PROMPT_ID: &str = "support.followup";

const ANSWER_PROMPT_YAML: &str = r#"
id: support.answer
title: Grounded support answer
apiVersion: "1.0"
createdBy: builtin
template: |-
  {{query}}

  {{factsLabel}}:
  {{facts}}
output:
  format: markdown
"#;

const FOLLOW_UP_PROMPT_YAML: &str = r#"
id: support.followup
title: Follow-up suggestions
apiVersion: "1.0"
createdBy: builtin
template: |-
  Given the following customer support response, suggest {{count}} helpful follow-up questions or next steps the user might ask. Only return the list:
  """{{answer}}"""
output:
  format: list
"#;

/// Look up a built-in prompt definition by id.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    let yaml = match prompt_id {
        ANSWER_PROMPT_ID => ANSWER_PROMPT_YAML,
        FOLLOW_UP_PROMPT_ID => FOLLOW_UP_PROMPT_YAML,
        _ => return None,
    };

    match serde_yaml::from_str(yaml) {
        Ok(definition) => Some(definition),
        Err(e) => {
            tracing::error!("Built-in prompt '{}' is invalid: {}", prompt_id, e);
            None
        }
    }
}
