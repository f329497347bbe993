//! HTTP search client.
//!
//! Implements `SearchClient` against an Elasticsearch-compatible REST API
//! using reqwest.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::connection::Connection;
use crate::error::{Result, SearchError};
use crate::search::{
    extract_message, fields_from_mapping_response, FieldDescriptor, RawResultEnvelope,
    SearchClient,
};

/// Search client speaking the store's REST API.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    client: Client,
}

impl HttpSearchClient {
    /// Creates a client for the given connection.
    ///
    /// No request timeout is set here; callers bound each operation.
    pub fn new(connection: &Connection) -> Result<Self> {
        let base_url = Url::parse(connection.endpoint())
            .map_err(|e| SearchError::config(format!("Invalid endpoint URL: {e}")))?;

        let client = Client::builder()
            .build()
            .map_err(|e| SearchError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            username: connection.username().map(String::from),
            password: connection.password().map(String::from),
            client,
        })
    }

    /// Builds an endpoint URL from path segments, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::config("Endpoint URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    /// Sends a request and decodes the JSON body.
    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                SearchError::transport(format!(
                    "Failed to connect to {}. Is the store running?",
                    self.base_url
                ))
            } else {
                SearchError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = extract_message(&body, status.as_u16());
            warn!(status = status.as_u16(), %message, "Search store returned an error");
            return Err(SearchError::remote(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|_| SearchError::decode(body))
    }
}

#[derive(Debug, Deserialize)]
struct CatIndexRow {
    index: String,
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut url = self.endpoint(&["_cat", "indices"])?;
        url.set_query(Some("format=json&h=index"));

        let body = self.send_json(self.request(Method::GET, url)).await?;
        let rows: Vec<CatIndexRow> =
            serde_json::from_value(body.clone()).map_err(|_| SearchError::decode(body.to_string()))?;

        let mut names: Vec<String> = rows
            .into_iter()
            .map(|row| row.index)
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();

        debug!(count = names.len(), "Listed collections");
        Ok(names)
    }

    async fn discover_fields(&self, collection: &str) -> Result<Vec<FieldDescriptor>> {
        let url = self.endpoint(&[collection, "_mapping"])?;
        let body = self.send_json(self.request(Method::GET, url)).await?;

        let fields = fields_from_mapping_response(&body);
        debug!(collection, count = fields.len(), "Discovered fields");
        Ok(fields)
    }

    async fn execute(
        &self,
        collection: Option<&str>,
        query: &str,
        flatten: bool,
    ) -> Result<RawResultEnvelope> {
        let url = match collection {
            Some(name) => self.endpoint(&[name, "_search"])?,
            None => self.endpoint(&["_search"])?,
        };

        let start = Instant::now();
        let request = self
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(query.to_string());
        let body = self.send_json(request).await?;

        let mut envelope = RawResultEnvelope::from_search_response(&body, flatten);
        if envelope.metadata.elapsed_ms.is_none() {
            envelope.metadata.elapsed_ms = Some(start.elapsed().as_millis() as u64);
        }

        debug!(
            hits = envelope.hits.len(),
            has_aggregations = envelope.aggregations.is_some(),
            "Executed query"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> HttpSearchClient {
        HttpSearchClient::new(&Connection::new(endpoint)).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let client = client("http://localhost:9200");
        let url = client.endpoint(&["sales", "_search"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/sales/_search");
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let client = client("https://proxy.local/es/");
        let url = client.endpoint(&["logs-*", "_mapping"]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.local/es/logs-*/_mapping");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:9200");
        let url = client.endpoint(&["a b/c", "_search"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/a%20b%2Fc/_search");
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = HttpSearchClient::new(&Connection::new("not a url"));
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = client("http://127.0.0.1:9");
        let result = client.list_collections().await;
        assert!(matches!(result, Err(SearchError::Transport(_))));
    }
}
