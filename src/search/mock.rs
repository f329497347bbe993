//! Mock search clients for testing.
//!
//! Provides in-memory implementations that record the calls made to them.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{FieldDescriptor, RawResultEnvelope, SearchClient};
use crate::error::{Result, SearchError};

/// Shared call log of a `MockSearchClient`.
///
/// Cloned handles observe the same counters after the client has been
/// moved into a session.
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    list: Arc<AtomicUsize>,
    discover: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockCalls {
    /// Number of collection listings issued.
    pub fn list_calls(&self) -> usize {
        self.list.load(Ordering::SeqCst)
    }

    /// Number of schema discoveries issued.
    pub fn discover_calls(&self) -> usize {
        self.discover.load(Ordering::SeqCst)
    }

    /// Number of query executions issued.
    pub fn execute_calls(&self) -> usize {
        self.executed_queries().len()
    }

    /// Query texts received, in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A mock search client that returns predefined results.
#[derive(Debug, Clone, Default)]
pub struct MockSearchClient {
    collections: Vec<String>,
    fields: HashMap<String, Vec<FieldDescriptor>>,
    failing_collections: HashSet<String>,
    response: Value,
    delay: Option<Duration>,
    calls: MockCalls,
}

impl MockSearchClient {
    /// Creates a mock with no collections and an empty search response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection with the given fields.
    pub fn with_collection(mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let name = name.into();
        self.collections.push(name.clone());
        self.fields.insert(name, fields);
        self
    }

    /// Makes schema discovery fail for the named collection.
    pub fn with_failing_collection(mut self, name: impl Into<String>) -> Self {
        self.failing_collections.insert(name.into());
        self
    }

    /// Sets the raw search response body returned by `execute`.
    pub fn with_response(mut self, body: Value) -> Self {
        self.response = body;
        self
    }

    /// Delays every call, for timeout and concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns a handle to the call log.
    pub fn calls(&self) -> MockCalls {
        self.calls.clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn list_collections(&self) -> Result<Vec<String>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.collections.clone())
    }

    async fn discover_fields(&self, collection: &str) -> Result<Vec<FieldDescriptor>> {
        self.calls.discover.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.failing_collections.contains(collection) {
            return Err(SearchError::remote(500, format!("mapping failed for [{collection}]")));
        }

        self.fields.get(collection).cloned().ok_or_else(|| {
            SearchError::remote(404, format!("no such index [{collection}]"))
        })
    }

    async fn execute(
        &self,
        _collection: Option<&str>,
        query: &str,
        flatten: bool,
    ) -> Result<RawResultEnvelope> {
        self.calls
            .queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());
        self.pause().await;

        Ok(RawResultEnvelope::from_search_response(&self.response, flatten))
    }
}

/// A search client whose every call fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingSearchClient {
    error: SearchError,
}

impl FailingSearchClient {
    pub fn new(error: SearchError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl SearchClient for FailingSearchClient {
    async fn list_collections(&self) -> Result<Vec<String>> {
        Err(self.error.clone())
    }

    async fn discover_fields(&self, _collection: &str) -> Result<Vec<FieldDescriptor>> {
        Err(self.error.clone())
    }

    async fn execute(
        &self,
        _collection: Option<&str>,
        _query: &str,
        _flatten: bool,
    ) -> Result<RawResultEnvelope> {
        Err(self.error.clone())
    }
}
