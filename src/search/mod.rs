//! Search store abstraction layer for es-glance.
//!
//! Provides a trait-based interface to the document store's collection
//! discovery, schema discovery and query execution, so the HTTP client and
//! the in-memory mocks can be used interchangeably.

mod http;
pub mod mapping;
mod message;
mod mock;
mod types;

pub use http::HttpSearchClient;
pub use mapping::{fields_from_mapping_response, format_fields};
pub use message::extract_message;
pub use mock::{FailingSearchClient, MockCalls, MockSearchClient};
pub use types::{
    flatten_into, Document, FieldDescriptor, MatchRelation, RawResultEnvelope, ResultMetadata,
};

use std::sync::Arc;

use crate::connection::Connection;
use crate::error::Result;
use async_trait::async_trait;

/// Creates a search client bound to the given connection.
///
/// This is the central factory function for store connections.
pub fn connect(connection: &Connection) -> Result<Arc<dyn SearchClient>> {
    Ok(Arc::new(HttpSearchClient::new(connection)?))
}

/// Trait defining the interface for search store clients.
///
/// A client is bound to one connection. None of the operations retry.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Lists the collections (indices) visible on this connection.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Discovers the fields of one collection.
    async fn discover_fields(&self, collection: &str) -> Result<Vec<FieldDescriptor>>;

    /// Executes a structured query, sending `query` verbatim.
    ///
    /// With no collection the query runs against every collection.
    async fn execute(
        &self,
        collection: Option<&str>,
        query: &str,
        flatten: bool,
    ) -> Result<RawResultEnvelope>;
}
