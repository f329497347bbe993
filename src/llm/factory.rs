//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use crate::error::{Result, SearchError};
use crate::llm::{
    LlmClient, LlmProvider, MockLlmClient, OllamaClient, OpenAiClient, OpenAiConfig,
};

/// Default OpenAI model when none is configured.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Creates an LLM client for the given provider.
///
/// If `api_key` is provided, it takes precedence over environment variables.
/// For OpenAI the key is resolved in order:
/// 1. Provided `api_key` parameter
/// 2. `OPENAI_API_KEY` environment variable
///
/// When `model` is `None` the provider's default applies
/// (`OPENAI_MODEL` or "gpt-4o" for OpenAI, `OLLAMA_MODEL` for Ollama).
pub fn create_client(
    provider: LlmProvider,
    model: Option<String>,
    api_key: Option<String>,
) -> Result<Arc<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let key = api_key
                .filter(|k| !k.trim().is_empty())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| {
                    SearchError::config("No API key configured. Set OPENAI_API_KEY.")
                })?;
            let model = model
                .or_else(|| std::env::var("OPENAI_MODEL").ok())
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
            let mut config = OpenAiConfig::new(key, model);
            if let Ok(url) = std::env::var("OPENAI_URL") {
                config = config.with_url(url);
            }
            Ok(Arc::new(OpenAiClient::new(config)?))
        }
        LlmProvider::Ollama => Ok(Arc::new(OllamaClient::from_env(model)?)),
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
