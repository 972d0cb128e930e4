//! Prompt loader: workspace overrides first, built-ins second.

use crate::builtin::builtin_prompt;
use crate::types::PromptDefinition;
use std::path::{Path, PathBuf};
use support_core::{AppError, AppResult};

/// Directory (relative to the workspace) holding prompt overrides.
const PROMPTS_DIR: &str = ".support/prompts";

/// Load a prompt definition by ID.
///
/// This function looks for `<id>.yml` in the workspace's `.support/prompts/`
/// directory and falls back to the built-in definition of the same id.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.support/`
/// * `prompt_id` - Prompt identifier (e.g., "support.answer")
///
/// # Example
/// ```no_run
/// use support_prompt::{load_prompt, ANSWER_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ANSWER_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        return load_prompt_file(&prompt_file);
    }

    builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

/// List prompt IDs overridden in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let prompts_dir = workspace_path.join(PROMPTS_DIR);

    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(PROMPTS_DIR)
        .join(format!("{}.yml", prompt_id))
}

fn load_prompt_file(prompt_file: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{ANSWER_PROMPT_ID, FOLLOW_UP_PROMPT_ID};
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &TempDir, id: &str, body: &str) {
        let prompts = dir.path().join(PROMPTS_DIR);
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let prompt = load_prompt(dir.path(), FOLLOW_UP_PROMPT_ID).unwrap();
        assert_eq!(prompt.created_by, "builtin");
    }

    #[test]
    fn test_workspace_override_wins() {
        let dir = TempDir::new().unwrap();
        write_override(
            &dir,
            ANSWER_PROMPT_ID,
            r#"
id: support.answer
title: Terse answer
apiVersion: "1.1"
system: Answer in one sentence.
template: "Q: {{query}}\n{{facts}}"
output:
  format: text
"#,
        );

        let prompt = load_prompt(dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Terse answer");
        assert_eq!(prompt.system.as_deref(), Some("Answer in one sentence."));
        assert_eq!(list_prompts(dir.path()).unwrap(), vec![ANSWER_PROMPT_ID]);
    }

    #[test]
    fn test_invalid_override_is_error() {
        let dir = TempDir::new().unwrap();
        write_override(
            &dir,
            ANSWER_PROMPT_ID,
            r#"
id: support.answer
title: Broken
apiVersion: "1"
template: "{{query}}"
output:
  format: text
"#,
        );

        let result = load_prompt(dir.path(), ANSWER_PROMPT_ID);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_unknown_prompt() {
        let dir = TempDir::new().unwrap();
        assert!(load_prompt(dir.path(), "support.nope").is_err());
        assert!(list_prompts(dir.path()).unwrap().is_empty());
    }
}
