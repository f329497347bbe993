//! Interactive session for es-glance.
//!
//! Owns the connection registry, the schema cache, the query draft and the
//! last normalized result. Every operation returns a `Result` and also
//! records failures in a single error slot, leaving the previous state
//! untouched so the user can retry.

mod draft;
mod guard;

pub use draft::{DraftOrigin, DraftState, QueryDraft};
pub use guard::{FlightGuard, InFlight, OperationKind};

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::{Config, TimeoutConfig};
use crate::connection::{ActiveConnection, Connection, ConnectionRegistry};
use crate::error::{Result, SearchError};
use crate::export::{export_file_name, ExportDocument};
use crate::llm::{GenerationRequest, QueryGenerator};
use crate::results::{normalize_with_limit, NormalizedResult, DISPLAY_LIMIT};
use crate::schema::{Fields, SchemaCache};
use crate::search::{self, SearchClient};

/// Settings a session starts with.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub timeouts: TimeoutConfig,
    pub display_limit: usize,
    pub flatten: bool,
    /// Model override sent with each generation request.
    pub model: Option<String>,
    /// API key override sent with each generation request.
    pub api_key: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            display_limit: DISPLAY_LIMIT,
            flatten: true,
            model: None,
            api_key: None,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeouts: config.timeouts.clone(),
            display_limit: config.results.display_limit,
            flatten: config.results.flatten,
            model: config.llm.model.clone().filter(|m| !m.is_empty()),
            api_key: None,
        }
    }
}

/// An export ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub document: ExportDocument,
}

/// Smallest and largest `/sample` sizes.
pub const SAMPLE_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1..=200;

/// Default number of documents fetched by a sample.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Query text and options the current results were produced with.
#[derive(Debug, Clone)]
struct ExecutedQuery {
    text: String,
    collection: Option<String>,
    flatten: bool,
}

#[derive(Default)]
struct SessionState {
    collection: Option<String>,
    draft: QueryDraft,
    phase: DraftState,
    results: Option<NormalizedResult>,
    executed: Option<ExecutedQuery>,
    last_error: Option<SearchError>,
    flatten: bool,
}

/// One operator's exploration session.
pub struct Session {
    registry: Mutex<ConnectionRegistry>,
    schema: SchemaCache,
    generator: Arc<dyn QueryGenerator>,
    in_flight: InFlight,
    settings: SessionSettings,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(generator: Arc<dyn QueryGenerator>, settings: SessionSettings) -> Self {
        let state = SessionState {
            flatten: settings.flatten,
            ..SessionState::default()
        };

        Self {
            registry: Mutex::new(ConnectionRegistry::new()),
            schema: SchemaCache::new(),
            generator,
            in_flight: InFlight::new(),
            settings,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> MutexGuard<'_, ConnectionRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a failure in the error slot and passes the result through.
    fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(category = e.category(), error = %e, "Operation failed");
            self.state().last_error = Some(e.clone());
        }
        result
    }

    fn require_connection(&self) -> Result<ActiveConnection> {
        self.registry().require()
    }

    // Connection

    /// Connects to `connection` over HTTP.
    pub fn connect(&self, connection: Connection) -> Result<()> {
        let client = self.record(search::connect(&connection))?;
        self.attach(connection, client);
        Ok(())
    }

    /// Makes `client` the active connection.
    ///
    /// The schema cache is cleared in the same step, and discoveries still
    /// running against the previous connection are abandoned.
    pub fn attach(&self, connection: Connection, client: Arc<dyn SearchClient>) {
        let target = connection.display_string();
        let generation = {
            let mut registry = self.registry();
            let generation = registry.replace(connection, client);
            self.schema.invalidate_all();
            generation
        };

        let mut state = self.state();
        state.results = None;
        state.last_error = None;
        info!(connection = %target, generation, "Connected");
    }

    /// Drops the active connection and its cached schemas.
    ///
    /// Returns the display string of the dropped connection, if any.
    pub fn disconnect(&self) -> Option<String> {
        let dropped = {
            let mut registry = self.registry();
            let dropped = registry
                .current()
                .map(|active| active.connection.display_string());
            registry.disconnect();
            self.schema.invalidate_all();
            dropped
        };

        self.state().results = None;
        if let Some(target) = &dropped {
            info!(connection = %target, "Disconnected");
        }
        dropped
    }

    pub fn is_connected(&self) -> bool {
        self.registry().is_connected()
    }

    /// Display string of the active connection.
    pub fn connection_display(&self) -> Option<String> {
        self.registry()
            .current()
            .map(|active| active.connection.display_string())
    }

    // Discovery

    /// Lists the collections on the active connection.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let result = self.list_collections_inner().await;
        self.record(result)
    }

    async fn list_collections_inner(&self) -> Result<Vec<String>> {
        let active = self.require_connection()?;
        let timeout = self.settings.timeouts.discovery();
        bounded(
            &active,
            timeout,
            "Collection discovery",
            active.client.list_collections(),
        )
        .await
    }

    /// Selects the collection that generation and execution target.
    pub fn select_collection(&self, collection: &str) -> Result<()> {
        let collection = collection.trim();
        if collection.is_empty() {
            return self.record(Err(SearchError::validation("Collection name is empty")));
        }

        self.state().collection = Some(collection.to_string());
        debug!(collection, "Collection selected");
        Ok(())
    }

    pub fn collection(&self) -> Option<String> {
        self.state().collection.clone()
    }

    /// Fields of the selected collection, discovered on first use.
    pub async fn fields(&self) -> Result<Fields> {
        let result = self.fields_inner().await;
        self.record(result)
    }

    async fn fields_inner(&self) -> Result<Fields> {
        let collection = self
            .collection()
            .ok_or_else(|| SearchError::validation("No collection selected"))?;
        self.fields_for(&collection).await
    }

    /// Fields of `collection`, discovered on first use.
    pub async fn fields_for(&self, collection: &str) -> Result<Fields> {
        let active = self.require_connection()?;
        self.schema
            .get_fields(&active, collection, self.settings.timeouts.discovery())
            .await
    }

    /// Discovers several collections concurrently.
    ///
    /// Each collection succeeds or fails on its own; failures are not cached.
    pub async fn prefetch_fields(&self, collections: &[String]) -> Vec<(String, Result<Fields>)> {
        let lookups = collections.iter().map(|c| async move {
            let result = self.fields_for(c).await;
            (c.clone(), result)
        });
        join_all(lookups).await
    }

    /// Number of cached collections.
    pub fn cached_schemas(&self) -> usize {
        self.schema.len()
    }

    // Draft lifecycle

    /// Drafts a query for `question` against the selected collection.
    ///
    /// Input is validated before any network call. On success the draft is
    /// replaced wholesale; on failure it is left as it was.
    pub async fn generate(&self, question: &str) -> Result<String> {
        let result = self.generate_inner(question).await;
        self.record(result)
    }

    async fn generate_inner(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SearchError::validation("Question is empty"));
        }
        let collection = self
            .collection()
            .ok_or_else(|| SearchError::validation("No collection selected"))?;
        self.require_connection()?;

        let _guard = self.in_flight.begin(OperationKind::Generation)?;
        self.set_phase(DraftState::Generating);

        let start = Instant::now();
        let outcome = self.draft_query(&collection, question).await;

        let mut state = self.state();
        match outcome {
            Ok(text) => {
                info!(
                    collection = %collection,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Draft replaced by generated query"
                );
                state.draft = QueryDraft::generated(text.clone());
                state.phase = DraftState::Drafted;
                state.last_error = None;
                Ok(text)
            }
            Err(e) => {
                state.phase = DraftState::Error;
                Err(e)
            }
        }
    }

    async fn draft_query(&self, collection: &str, question: &str) -> Result<String> {
        let fields = self.fields_for(collection).await?;
        let request = GenerationRequest::new(collection, question, fields)
            .with_model(self.settings.model.clone())
            .with_api_key(self.settings.api_key.clone());

        let timeout = self.settings.timeouts.generation();
        let text = tokio::time::timeout(timeout, self.generator.generate(&request))
            .await
            .map_err(|_| SearchError::timeout("Query generation", timeout.as_secs()))??;

        if text.trim().is_empty() {
            return Err(SearchError::generation("The model returned an empty query"));
        }
        Ok(text)
    }

    /// Replaces the draft text. No network call.
    pub fn edit(&self, text: &str) {
        let mut state = self.state();
        state.draft.replace(text);
        state.phase = DraftState::Editing;
    }

    /// Appends a line to the draft. No network call.
    pub fn append(&self, line: &str) {
        let mut state = self.state();
        state.draft.append_line(line);
        state.phase = DraftState::Editing;
    }

    pub fn draft(&self) -> QueryDraft {
        self.state().draft.clone()
    }

    pub fn phase(&self) -> DraftState {
        self.state().phase
    }

    fn set_phase(&self, phase: DraftState) {
        self.state().phase = phase;
    }

    // Execution

    /// Executes the draft text verbatim and normalizes the response.
    ///
    /// The draft is kept, so the same query can be run again. A failure
    /// clears the previous results.
    pub async fn execute(&self) -> Result<NormalizedResult> {
        let result = self.execute_inner().await;
        self.record(result)
    }

    async fn execute_inner(&self) -> Result<NormalizedResult> {
        let (query, collection, flatten) = {
            let state = self.state();
            (
                state.draft.text().to_string(),
                state.collection.clone(),
                state.flatten,
            )
        };
        if query.trim().is_empty() {
            return Err(SearchError::validation("Query draft is empty"));
        }
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&query) {
            return Err(SearchError::validation(format!("Query is not valid JSON: {e}")));
        }
        let active = self.require_connection()?;

        let _guard = self.in_flight.begin(OperationKind::Execution)?;
        self.set_phase(DraftState::Executing);

        let executed = ExecutedQuery {
            text: query,
            collection,
            flatten,
        };
        let outcome = self.search(&active, &executed).await;

        let mut state = self.state();
        match outcome {
            Ok(result) => {
                state.results = Some(result.clone());
                state.executed = Some(executed);
                state.phase = DraftState::Executed;
                state.last_error = None;
                Ok(result)
            }
            Err(e) => {
                state.results = None;
                state.phase = DraftState::Error;
                Err(e)
            }
        }
    }

    /// Fetches the first `size` documents of the selected collection.
    ///
    /// Runs as an execution and replaces the results, but leaves the draft
    /// and its phase alone.
    pub async fn sample(&self, size: usize) -> Result<NormalizedResult> {
        let result = self.sample_inner(size).await;
        self.record(result)
    }

    async fn sample_inner(&self, size: usize) -> Result<NormalizedResult> {
        if !SAMPLE_SIZE_RANGE.contains(&size) {
            return Err(SearchError::validation(format!(
                "Sample size must be between {} and {}",
                SAMPLE_SIZE_RANGE.start(),
                SAMPLE_SIZE_RANGE.end()
            )));
        }
        let (collection, flatten) = {
            let state = self.state();
            (state.collection.clone(), state.flatten)
        };
        let collection =
            collection.ok_or_else(|| SearchError::validation("No collection selected"))?;
        let active = self.require_connection()?;

        let _guard = self.in_flight.begin(OperationKind::Execution)?;

        let executed = ExecutedQuery {
            text: serde_json::json!({ "size": size }).to_string(),
            collection: Some(collection.clone()),
            flatten,
        };
        let outcome = self.search(&active, &executed).await.map(|mut result| {
            if !result.is_empty() {
                result.summary =
                    format!("Showing {} documents from {}", result.total_rows, collection);
            }
            result
        });

        let mut state = self.state();
        match outcome {
            Ok(result) => {
                state.results = Some(result.clone());
                state.executed = Some(executed);
                state.last_error = None;
                Ok(result)
            }
            Err(e) => {
                state.results = None;
                Err(e)
            }
        }
    }

    /// Sends `executed` to the store and normalizes the response.
    async fn search(
        &self,
        active: &ActiveConnection,
        executed: &ExecutedQuery,
    ) -> Result<NormalizedResult> {
        let timeout = self.settings.timeouts.execution();
        let envelope = bounded(
            active,
            timeout,
            "Query execution",
            active.client.execute(
                executed.collection.as_deref(),
                &executed.text,
                executed.flatten,
            ),
        )
        .await?;

        let result = normalize_with_limit(&envelope, self.settings.display_limit);
        info!(
            shape = result.shape,
            rows = result.total_rows,
            elapsed_ms = envelope.metadata.elapsed_ms,
            "Query executed"
        );
        Ok(result)
    }

    pub fn results(&self) -> Option<NormalizedResult> {
        self.state().results.clone()
    }

    /// Text of the last successfully executed query.
    pub fn executed_query(&self) -> Option<String> {
        self.state().executed.as_ref().map(|executed| executed.text.clone())
    }

    pub fn set_flatten(&self, flatten: bool) {
        self.state().flatten = flatten;
    }

    pub fn flatten(&self) -> bool {
        self.state().flatten
    }

    // Export

    /// Builds the CSV export of the current results.
    ///
    /// The file name uses the collection and flatten option the results were
    /// produced with, not the current selection.
    pub fn export(&self) -> Result<ExportArtifact> {
        let artifact = {
            let state = self.state();
            state
                .results
                .as_ref()
                .zip(state.executed.as_ref())
                .map(|(results, executed)| {
                    let document = ExportDocument::from_rows(&results.rows);
                    ExportArtifact {
                        file_name: export_file_name(
                            executed.collection.as_deref(),
                            document.row_count(),
                            executed.flatten,
                        ),
                        document,
                    }
                })
        };
        self.record(artifact.ok_or_else(|| SearchError::validation("No results to export")))
    }

    // Error slot

    /// Records a failure that happened outside the session, such as
    /// writing an export file.
    pub fn report(&self, error: SearchError) {
        let _ = self.record::<()>(Err(error));
    }

    pub fn last_error(&self) -> Option<SearchError> {
        self.state().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.state().last_error = None;
    }
}

/// Runs `operation` under `timeout`, abandoning it if the connection is
/// replaced first.
async fn bounded<T>(
    active: &ActiveConnection,
    timeout: Duration,
    operation: &str,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = active.cancel.cancelled() => {
            Err(SearchError::stale(operation.to_string()))
        }
        result = tokio::time::timeout(timeout, future) => {
            result.map_err(|_| SearchError::timeout(operation, timeout.as_secs()))?
        }
    }
}
