//! Mock LLM client for testing.
//!
//! Provides deterministic query drafts based on input patterns.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for testing and offline demos without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("average") && input_lower.contains(" by ") {
            return r#"```json
{
  "size": 0,
  "aggs": {
    "group_by_location": {
      "terms": { "field": "location_id" },
      "aggs": { "average_total_sales": { "avg": { "field": "total_sales" } } }
    }
  }
}
```"#
                .to_string();
        }

        if input_lower.contains("average") {
            return r#"```json
{ "size": 0, "aggs": { "average_total_sales": { "avg": { "field": "total_sales" } } } }
```"#
                .to_string();
        }

        if input_lower.contains("count") {
            return "```json\n{ \"size\": 0, \"track_total_hits\": true }\n```".to_string();
        }

        if input_lower.contains("show") || input_lower.contains("list") {
            return "```json\n{ \"query\": { \"match_all\": {} }, \"size\": 10 }\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}
