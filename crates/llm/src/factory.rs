//! Generation client factory.
//!
//! Resolves a provider name to a concrete `LlmClient`, applying the
//! endpoint override, API key and request timeout.

use crate::client::LlmClient;
use crate::providers::{ollama, openai, OllamaClient, OpenAiCompatibleClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;
use storyloom_core::{AppError, AppResult};

/// Create a generation client.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "groq", "openai")
/// * `endpoint` - Optional base URL override
/// * `api_key` - API key, required by every provider except Ollama
/// * `timeout_secs` - Request timeout; a timed-out request fails with `AppError::Generation`
///
/// # Errors
/// `AppError::Config` if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: u64,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;
    let timeout = Duration::from_secs(timeout_secs);

    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(AppError::Config(format!(
            "{} provider requires an API key",
            provider_type.as_str()
        )));
    }

    tracing::debug!(
        provider = provider_type.as_str(),
        timeout_secs,
        "Creating generation client"
    );

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(ollama::DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::new(base_url, timeout)?))
        }
        ProviderType::Groq | ProviderType::OpenAI => {
            let default_url = if provider_type == ProviderType::Groq {
                openai::GROQ_BASE_URL
            } else {
                openai::OPENAI_BASE_URL
            };
            let client = OpenAiCompatibleClient::new(
                provider_type.as_str(),
                endpoint.unwrap_or(default_url),
                api_key.unwrap_or_default(),
                timeout,
            )?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, 60).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None, 60);
        assert!(client.is_ok());
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", None, None, 60) {
            Err(err) => assert!(err.to_string().contains("requires an API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_create_groq_client() {
        let client = create_client("groq", None, Some("key"), 60).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, 60) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
