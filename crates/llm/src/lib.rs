//! Generation service integration for storyloom.
//!
//! A provider-agnostic `LlmClient` trait with one non-streaming operation,
//! `complete`. Every client enforces a request timeout; a timeout fails the
//! whole request and is never retried.
//!
//! # Providers
//! - **Ollama**: local runtime (`/api/generate`)
//! - **Groq / OpenAI**: OpenAI-compatible `/chat/completions`
//!
//! # Example
//! ```no_run
//! use storyloom_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, 60)?;
//! let request = LlmRequest::new("Tell me about dragons", "llama3.2")
//!     .with_temperature(0.5)
//!     .with_max_tokens(500);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatibleClient};
pub use types::ProviderType;
