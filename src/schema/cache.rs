//! Per-collection schema cache.
//!
//! Discovered field lists are memoized and never refreshed implicitly. A
//! reconnect must call `invalidate_all`, which also bumps an epoch so that
//! discoveries started before the reconnect cannot write into the cache
//! after it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::connection::ActiveConnection;
use crate::error::{Result, SearchError};
use crate::search::FieldDescriptor;

/// Cached field list for one collection.
pub type Fields = Arc<[FieldDescriptor]>;

/// Cache key: connection identity and collection name.
type CacheKey = (String, String);

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Fields>,
    epoch: u64,
}

/// Memoizes schema discovery per (connection, collection).
#[derive(Default)]
pub struct SchemaCache {
    state: Mutex<CacheState>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached fields without any network call.
    pub fn lookup(&self, identity: &str, collection: &str) -> Option<Fields> {
        self.state()
            .entries
            .get(&(identity.to_string(), collection.to_string()))
            .cloned()
    }

    /// Drops every entry and invalidates in-flight discoveries.
    pub fn invalidate_all(&self) {
        let mut state = self.state();
        let dropped = state.entries.len();
        state.entries.clear();
        state.epoch += 1;
        info!(dropped, epoch = state.epoch, "Schema cache invalidated");
    }

    /// Number of cached collections.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn epoch(&self) -> u64 {
        self.state().epoch
    }

    /// Stores a discovery result if no invalidation happened since `epoch`.
    fn store(&self, epoch: u64, key: CacheKey, fields: Vec<FieldDescriptor>) -> Result<Fields> {
        let mut state = self.state();
        if state.epoch != epoch {
            warn!(collection = %key.1, "Discarding schema discovered before reconnect");
            return Err(SearchError::stale(format!("schema for '{}'", key.1)));
        }

        let fields: Fields = fields.into();
        state.entries.insert(key, Arc::clone(&fields));
        Ok(fields)
    }

    /// Returns the fields for `collection`, discovering them on first use.
    ///
    /// Discovery is bounded by `timeout` and abandoned when the connection is
    /// replaced. Failures leave no entry behind, so a later call retries.
    pub async fn get_fields(
        &self,
        active: &ActiveConnection,
        collection: &str,
        timeout: Duration,
    ) -> Result<Fields> {
        if collection.trim().is_empty() {
            return Err(SearchError::validation("A collection must be selected"));
        }

        let identity = active.connection.identity();
        if let Some(fields) = self.lookup(&identity, collection) {
            debug!(collection, "Schema cache hit");
            return Ok(fields);
        }

        let epoch = self.epoch();
        let start = Instant::now();
        debug!(collection, "Schema cache miss, discovering");

        let discovery = tokio::time::timeout(timeout, active.client.discover_fields(collection));
        let fields = tokio::select! {
            _ = active.cancel.cancelled() => {
                return Err(SearchError::stale(format!("schema for '{collection}'")));
            }
            result = discovery => result
                .map_err(|_| SearchError::timeout("Schema discovery", timeout.as_secs()))??,
        };

        info!(
            collection,
            count = fields.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Schema discovered"
        );
        self.store(epoch, (identity, collection.to_string()), fields)
    }
}
