//! OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait for OpenAI's chat completions API.
//! Requests are not retried; the caller decides whether to try again.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::llm::types::{ChatMessage, Message};
use crate::llm::LlmClient;
use crate::search::extract_message;

/// OpenAI API base URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-4o", "gpt-4o-mini").
    pub model: String,
    /// Chat completions endpoint.
    pub url: String,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            url: OPENAI_API_URL.to_string(),
        }
    }

    /// Overrides the endpoint, for OpenAI-compatible gateways.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| SearchError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: 0.0,
        };

        debug!(model = %self.config.model, message_count = messages.len(), "OpenAI request");

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SearchError::transport("Failed to connect to OpenAI")
                } else {
                    SearchError::transport(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(SearchError::remote(
                status.as_u16(),
                extract_message(&body, status.as_u16()),
            ));
        }

        let response: OpenAiResponse =
            serde_json::from_str(&body).map_err(|_| SearchError::decode(body.clone()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SearchError::generation("No response from OpenAI"))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.url, OPENAI_API_URL);
    }

    #[test]
    fn test_config_with_url() {
        let config = OpenAiConfig::new("k", "m").with_url("http://gateway.local/v1/chat");
        assert_eq!(config.url, "http://gateway.local/v1/chat");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"size\": 1}"}}]}"#;
        let parsed: OpenAiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "{\"size\": 1}");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client =
            OpenAiClient::new(OpenAiConfig::new("k", "m").with_url("http://127.0.0.1:9/v1")).unwrap();
        let result = client.complete(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(SearchError::Transport(_))));
    }
}
