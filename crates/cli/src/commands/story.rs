//! Story command handler.
//!
//! Opens the retrieval context only when a category is requested, generates
//! the story and records the session in `.storyloom/sessions.json`.

use super::print_json;
use clap::Args;
use serde::Serialize;
use storyloom_core::{config::AppConfig, AppResult};
use storyloom_llm::create_client;
use storyloom_story::{
    GenerationSettings, JsonFileSessionStore, SessionStore, StoryGenerator, StorySession,
    StoryTemplate,
};

/// Generate a story, optionally grounded in a category
#[derive(Args, Debug)]
pub struct StoryCommand {
    /// What the story should be about
    pub prompt: String,

    /// Category whose documents provide context
    #[arg(long)]
    pub category: Option<String>,

    /// User recorded with the session
    #[arg(short, long, env = "STORYLOOM_USER", default_value = "anonymous")]
    pub user: String,

    /// Temperature for generation (default: 0.5)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the story (default: 500)
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Context chunks retrieved for the category (default: 2)
    #[arg(long)]
    pub context_k: Option<usize>,

    /// System prompt sent with the story request
    #[arg(long)]
    pub system: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StoryOutput<'a> {
    session_id: &'a str,
    story: &'a str,
    model: &'a str,
    category: Option<&'a str>,
    context: &'a [String],
    timestamp: String,
}

impl StoryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing story command");
        tracing::debug!("Story options: {:?}", self);

        config.validate()?;

        let api_key = config.resolve_api_key(&config.provider);
        let client = create_client(
            &config.provider,
            config.provider_endpoint(&config.provider),
            api_key.as_deref(),
            config.request_timeout_secs,
        )?;

        let retrieval = match self.category {
            Some(_) => match storyloom_retrieval::open(&config.workspace).await {
                Ok(context) => Some(context),
                Err(e) => {
                    tracing::warn!("Corpus unavailable, generating without context: {}", e);
                    None
                }
            },
            None => None,
        };

        let generator = StoryGenerator::new(
            client,
            retrieval,
            StoryTemplate::load(&config.workspace)?,
            self.settings(config),
        );

        let outcome = generator
            .generate(&self.prompt, self.category.as_deref())
            .await?;

        let session = StorySession::new(
            &self.user,
            &self.prompt,
            self.category.clone(),
            &outcome.story,
        );
        let store = JsonFileSessionStore::for_workspace(&config.workspace);
        let session_id = store.record(&session)?;

        if self.json {
            return print_json(&StoryOutput {
                session_id: &session_id,
                story: &outcome.story,
                model: &outcome.model,
                category: self.category.as_deref(),
                context: &outcome.context,
                timestamp: session.timestamp.to_rfc3339(),
            });
        }

        println!("{}", outcome.story);
        Ok(())
    }

    fn settings(&self, config: &AppConfig) -> GenerationSettings {
        let mut settings = GenerationSettings::for_model(&config.model);
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(context_k) = self.context_k {
            settings.context_k = context_k;
        }
        settings.system = self.system.clone();
        settings
    }
}
