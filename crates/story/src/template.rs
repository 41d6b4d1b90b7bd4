//! Story prompt template.

use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};
use storyloom_core::config::STATE_DIR;
use storyloom_core::{AppError, AppResult};

/// Built-in story template.
pub const DEFAULT_STORY_TEMPLATE: &str = "Write a concise story (under 300 words) about:\n\
{{prompt}}{{#if context}}\n\nRelevant context:\n{{context}}{{/if}}\n\n\
Guidelines:\n\
- Focus on key elements\n\
- Use clear language\n\
- Keep it engaging";

const TEMPLATE_NAME: &str = "story";

#[derive(Debug, Serialize)]
struct StoryVariables<'a> {
    prompt: &'a str,
    context: Option<String>,
}

/// Compiled story template. Output is plain text, never HTML-escaped.
#[derive(Debug)]
pub struct StoryTemplate {
    handlebars: Handlebars<'static>,
}

impl StoryTemplate {
    pub fn new(template: &str) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| AppError::Template(format!("Failed to register template: {}", e)))?;
        Ok(Self { handlebars })
    }

    /// The workspace override at `.storyloom/prompts/story.hbs`, or the
    /// built-in template.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let path = override_path(workspace);
        if !path.exists() {
            return Self::new(DEFAULT_STORY_TEMPLATE);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            AppError::Template(format!("Failed to read template {:?}: {}", path, e))
        })?;
        tracing::info!("Using story template override {:?}", path);
        Self::new(&contents)
    }

    /// Render the prompt; `context` chunks are joined by newlines and the
    /// context section is omitted when there are none.
    pub fn render(&self, prompt: &str, context: &[String]) -> AppResult<String> {
        let variables = StoryVariables {
            prompt,
            context: (!context.is_empty()).then(|| context.join("\n")),
        };

        self.handlebars
            .render(TEMPLATE_NAME, &variables)
            .map_err(|e| AppError::Template(format!("Failed to render template: {}", e)))
    }
}

/// Location of the workspace template override.
pub fn override_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("prompts").join("story.hbs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_without_context() {
        let template = StoryTemplate::new(DEFAULT_STORY_TEMPLATE).unwrap();
        let rendered = template.render("a lighthouse keeper", &[]).unwrap();

        assert_eq!(
            rendered,
            "Write a concise story (under 300 words) about:\na lighthouse keeper\n\n\
             Guidelines:\n- Focus on key elements\n- Use clear language\n- Keep it engaging"
        );
    }

    #[test]
    fn test_render_with_context() {
        let template = StoryTemplate::new(DEFAULT_STORY_TEMPLATE).unwrap();
        let context = vec!["The dragon slept.".to_string(), "Gold & gems.".to_string()];
        let rendered = template.render("a dragon", &context).unwrap();

        assert!(rendered.starts_with(
            "Write a concise story (under 300 words) about:\na dragon\n\n\
             Relevant context:\nThe dragon slept.\nGold & gems.\n\nGuidelines:"
        ));
    }

    #[test]
    fn test_workspace_override() {
        let temp = TempDir::new().unwrap();
        let path = override_path(temp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "Tell me about {{prompt}}.").unwrap();

        let template = StoryTemplate::load(temp.path()).unwrap();
        assert_eq!(template.render("owls", &[]).unwrap(), "Tell me about owls.");
    }

    #[test]
    fn test_default_when_no_override() {
        let temp = TempDir::new().unwrap();
        let template = StoryTemplate::load(temp.path()).unwrap();
        assert!(template.render("x", &[]).unwrap().starts_with("Write a concise story"));
    }

    #[test]
    fn test_invalid_template() {
        let result = StoryTemplate::new("{{#if prompt}}unclosed");
        assert!(matches!(result, Err(AppError::Template(_))));
    }
}
