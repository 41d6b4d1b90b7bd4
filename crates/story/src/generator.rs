//! Retrieval-augmented story generation.

use crate::template::StoryTemplate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storyloom_core::{AppError, AppResult};
use storyloom_llm::{LlmClient, LlmRequest, LlmUsage};
use storyloom_retrieval::RetrievalContext;

/// Sampling and context settings for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Chunks retrieved as context when a category is given
    #[serde(default = "default_context_k")]
    pub context_k: usize,

    /// Optional system prompt sent ahead of the story prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    500
}

fn default_context_k() -> usize {
    2
}

impl GenerationSettings {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_k: default_context_k(),
            system: None,
        }
    }
}

/// A generated story plus what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct StoryOutcome {
    pub story: String,
    pub model: String,

    /// Chunks placed in the prompt, nearest first
    pub context: Vec<String>,

    pub usage: LlmUsage,
}

/// Builds the story prompt, optionally grounded in retrieved chunks, and
/// sends it to the generation client.
pub struct StoryGenerator {
    client: Arc<dyn LlmClient>,
    retrieval: Option<Arc<RetrievalContext>>,
    template: StoryTemplate,
    settings: GenerationSettings,
}

impl StoryGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        retrieval: Option<Arc<RetrievalContext>>,
        template: StoryTemplate,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            retrieval,
            template,
            settings,
        }
    }

    /// Generate a story for `prompt`.
    ///
    /// Context is retrieved only when `category` is given; retrieval problems
    /// leave the prompt without context. A failed completion is returned as
    /// `AppError::Generation`.
    pub async fn generate(&self, prompt: &str, category: Option<&str>) -> AppResult<StoryOutcome> {
        let preview: String = prompt.chars().take(40).collect();
        tracing::info!("Generating story for: {}...", preview);

        let context = match (category, &self.retrieval) {
            (Some(category), Some(retrieval)) => {
                retrieval
                    .retrieve(prompt, Some(category), self.settings.context_k)
                    .await
            }
            (Some(category), None) => {
                tracing::warn!("No corpus available; category '{}' ignored", category);
                Vec::new()
            }
            (None, _) => Vec::new(),
        };
        tracing::debug!("Using {} context chunks", context.len());

        let rendered = self.template.render(prompt, &context)?;

        let mut request = LlmRequest::new(rendered, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(system) = &self.settings.system {
            request = request.with_system(system.as_str());
        }

        let response = self.client.complete(&request).await.map_err(|e| {
            tracing::error!("Story generation failed: {}", e);
            match e {
                AppError::Generation(_) => e,
                other => AppError::Generation(other.to_string()),
            }
        })?;

        tracing::info!(
            model = %response.model,
            completion_tokens = response.usage.completion_tokens,
            "Story generated"
        );

        Ok(StoryOutcome {
            story: response.content,
            model: response.model,
            context,
            usage: response.usage,
        })
    }
}
