//! Natural-language to structured-query generation.
//!
//! Wraps an LLM client behind the `QueryGenerator` seam the session drafts
//! queries through. One request, one response; nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, SearchError};
use crate::llm::factory::create_client;
use crate::llm::parser::parse_llm_response;
use crate::llm::prompt::build_messages;
use crate::llm::{LlmClient, LlmProvider};
use crate::search::FieldDescriptor;

/// Everything a generator needs to draft one query.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Collection the query will run against.
    pub collection: String,
    /// The analyst's question.
    pub question: String,
    /// Discovered fields of `collection`.
    pub fields: Arc<[FieldDescriptor]>,
    /// Model override for this request.
    pub model: Option<String>,
    /// API key override for this request.
    pub api_key: Option<String>,
}

impl GenerationRequest {
    pub fn new(
        collection: impl Into<String>,
        question: impl Into<String>,
        fields: Arc<[FieldDescriptor]>,
    ) -> Self {
        Self {
            collection: collection.into(),
            question: question.into(),
            fields,
            model: None,
            api_key: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Drafts structured query text from a question.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Returns non-empty query text, or an error.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Query generator backed by an LLM provider.
pub struct LlmQueryGenerator {
    provider: LlmProvider,
    model: Option<String>,
    client: Option<Arc<dyn LlmClient>>,
}

impl LlmQueryGenerator {
    /// Creates a generator that builds a client per request.
    pub fn new(provider: LlmProvider, model: Option<String>) -> Self {
        Self {
            provider,
            model,
            client: None,
        }
    }

    /// Creates a generator that always uses `client`, ignoring overrides.
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self {
            provider: LlmProvider::Mock,
            model: None,
            client: Some(client),
        }
    }

    fn client_for(&self, request: &GenerationRequest) -> Result<Arc<dyn LlmClient>> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }
        let model = request.model.clone().or_else(|| self.model.clone());
        create_client(self.provider, model, request.api_key.clone())
    }
}

#[async_trait]
impl QueryGenerator for LlmQueryGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let client = self.client_for(request)?;
        let messages = build_messages(&request.collection, &request.fields, &request.question);

        let start = Instant::now();
        let response = client.complete(&messages).await?;
        debug!(response_len = response.len(), "LLM response received");

        let parsed = parse_llm_response(&response);
        let query = parsed
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| {
                if parsed.text.is_empty() {
                    SearchError::generation("The model returned no query")
                } else {
                    SearchError::generation(format!("The model returned no query: {}", parsed.text))
                }
            })?;

        info!(
            collection = %request.collection,
            duration_ms = start.elapsed().as_millis() as u64,
            "Query drafted"
        );
        Ok(query)
    }
}
