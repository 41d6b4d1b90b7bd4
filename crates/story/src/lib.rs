//! Story generation on top of corpus retrieval.
//!
//! - Handlebars story template with optional workspace override
//! - `StoryGenerator`: retrieve category context, render, complete
//! - Session history behind a key-value `SessionStore`

pub mod generator;
pub mod history;
pub mod template;

pub use generator::{GenerationSettings, StoryGenerator, StoryOutcome};
pub use history::{JsonFileSessionStore, SessionStore, StorySession};
pub use template::{StoryTemplate, DEFAULT_STORY_TEMPLATE};
