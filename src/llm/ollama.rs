//! Ollama LLM client implementation.
//!
//! Implements the LlmClient trait for local Ollama instances.
//! Used primarily for drafting queries without API costs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::llm::types::{ChatMessage, Message};
use crate::llm::LlmClient;
use crate::search::extract_message;

/// Default Ollama API URL.
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default Ollama model.
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";

/// Ollama client configuration.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to use (e.g., "llama3.2:3b", "qwen2.5-coder").
    pub model: String,
}

impl OllamaConfig {
    /// Creates a new config with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
        }
    }

    /// Sets the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_MODEL)
    }
}

/// Ollama LLM client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

impl OllamaClient {
    /// Creates a new Ollama client with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| SearchError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `OLLAMA_URL` for the base URL (defaults to http://localhost:11434).
    /// The model falls back to `OLLAMA_MODEL`, then to "llama3.2:3b".
    pub fn from_env(model: Option<String>) -> Result<Self> {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model = model
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());

        Self::new(OllamaConfig::new(model).with_url(base_url))
    }

    /// Returns the chat API endpoint URL.
    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SearchError::transport(
                        "Failed to connect to Ollama. Is it running? Try: ollama serve",
                    )
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

        let response: OllamaResponse =
            serde_json::from_str(&body).map_err(|_| SearchError::decode(body.clone()))?;

        Ok(response.message.content)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: ChatMessage,
}
