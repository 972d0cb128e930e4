//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use support_core::{AppError, AppResult};

/// Build a prompt from a definition and input variables.
///
/// The template is rendered with Handlebars, HTML escaping disabled, so the
/// variables appear in the output byte for byte.
///
/// # Example
/// ```no_run
/// use support_prompt::{build_prompt, builtin_prompt, ANSWER_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(ANSWER_PROMPT_ID).unwrap();
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "How long do refunds take?".to_string());
/// vars.insert("factsLabel".to_string(), "Support Info".to_string());
/// vars.insert("facts".to_string(), "Refunds take 5 days.".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{builtin_prompt, ANSWER_PROMPT_ID, FOLLOW_UP_PROMPT_ID};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{prompt}}", &vars(&[("prompt", "Hello, world!")]));
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_answer_prompt_layout() {
        let def = builtin_prompt(ANSWER_PROMPT_ID).unwrap();
        let built = build_prompt(
            &def,
            vars(&[
                ("query", "How long does a refund take?"),
                ("factsLabel", "Support Info"),
                ("facts", "Refunds take 5 days.\nShipping is free over $50."),
            ]),
        )
        .unwrap();

        assert_eq!(
            built.user,
            "How long does a refund take?\n\nSupport Info:\nRefunds take 5 days.\nShipping is free over $50."
        );
        assert_eq!(built.metadata.source_prompt_id, ANSWER_PROMPT_ID);
        assert!(built.system.is_none());
    }

    #[test]
    fn test_no_html_escaping() {
        let def = builtin_prompt(FOLLOW_UP_PROMPT_ID).unwrap();
        let built = build_prompt(
            &def,
            vars(&[("count", "2"), ("answer", "Use <b>Orders</b> & \"Returns\"")]),
        )
        .unwrap();

        assert!(built.user.contains("\"\"\"Use <b>Orders</b> & \"Returns\"\"\"\""));
        assert!(built.user.contains("suggest 2 helpful"));
    }

    #[test]
    fn test_render_template_missing_variable() {
        // Handlebars renders missing variables as empty string
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert_eq!(result.unwrap(), "Question: ");
    }
}
