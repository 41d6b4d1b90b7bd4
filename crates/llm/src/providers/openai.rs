//! OpenAI-compatible chat completions provider (Groq, OpenAI).

use crate::client::{http_client, transport_error, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storyloom_core::{AppError, AppResult};

/// Groq's OpenAI-compatible base URL.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// OpenAI base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Client for any endpoint speaking the OpenAI chat completions protocol.
pub struct OpenAiCompatibleClient {
    provider: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    /// Create a client. `provider` is only used for logs and error messages.
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            provider: provider.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client: http_client(timeout)?,
        })
    }

    fn to_chat_request<'a>(&self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| {
                AppError::Config(format!("Invalid API key for provider '{}'", self.provider))
            })?,
        );
        Ok(headers)
    }

    fn convert_response(&self, request: &LlmRequest, response: ChatResponse) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Generation(format!("{} returned no completion choices", self.provider))
            })?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let model = if response.model.is_empty() {
            request.model.clone()
        } else {
            response.model
        };

        Ok(LlmResponse {
            content,
            model,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(provider = %self.provider, model = %request.model, "Sending chat completion request");

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&self.to_chat_request(request))
            .send()
            .await
            .map_err(|e| transport_error(&self.provider, self.timeout, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Generation(format!(
                "{} returned {}: {}",
                self.provider, status, text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(&self.provider, self.timeout, e))?;

        self.convert_response(request, parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new("groq", GROQ_BASE_URL, "test-key", Duration::from_secs(60))
            .unwrap()
    }

    #[test]
    fn test_chat_request_with_system() {
        let request = LlmRequest::new("A dragon story", "llama3-8b-8192")
            .with_system("You are a storyteller")
            .with_temperature(0.5)
            .with_max_tokens(500);

        let json = serde_json::to_value(client().to_chat_request(&request)).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "A dragon story");
        assert_eq!(json["max_tokens"], 500);
    }

    #[test]
    fn test_chat_request_without_system() {
        let request = LlmRequest::new("prompt", "model");
        let json = serde_json::to_value(client().to_chat_request(&request)).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_convert_response() {
        let raw = r#"{
            "model": "llama3-8b-8192",
            "choices": [{"message": {"role": "assistant", "content": "The end."}}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 3, "total_tokens": 23}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let request = LlmRequest::new("p", "llama3-8b-8192");
        let response = client().convert_response(&request, parsed).unwrap();
        assert_eq!(response.content, "The end.");
        assert_eq!(response.usage.total_tokens, 23);
    }

    #[test]
    fn test_convert_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let request = LlmRequest::new("p", "m");
        let result = client().convert_response(&request, parsed);
        assert!(matches!(result, Err(AppError::Generation(_))));
    }

    #[test]
    fn test_authorization_header() {
        let headers = client().headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer test-key");
    }
}
