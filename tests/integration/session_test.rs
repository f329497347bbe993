//! Draft lifecycle and execution integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use es_glance::connection::Connection;
use es_glance::error::{Result, SearchError};
use es_glance::llm::{GenerationRequest, QueryGenerator};
use es_glance::search::{FailingSearchClient, MockSearchClient};
use es_glance::session::{DraftOrigin, DraftState, Session, SessionSettings};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

use super::{bucket_response, mock_session, sales_store};

/// Generator that records each request and answers with fixed text.
#[derive(Default)]
struct RecordingGenerator {
    requests: Mutex<Vec<GenerationRequest>>,
    answer: String,
}

#[async_trait]
impl QueryGenerator for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.answer.clone())
    }
}

fn connected(session: &Session, store: MockSearchClient) {
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    session.select_collection("sales").unwrap();
}

#[tokio::test]
async fn test_generation_sends_cached_fields_and_overrides() {
    let generator = Arc::new(RecordingGenerator {
        answer: "{\"size\": 3}".to_string(),
        ..Default::default()
    });
    let settings = SessionSettings {
        model: Some("llama3.2:3b".to_string()),
        api_key: Some("sk-test".to_string()),
        ..SessionSettings::default()
    };
    let session = Session::new(generator.clone(), settings);
    let store = sales_store(json!({}));
    let calls = store.calls();
    connected(&session, store);

    session.generate("top three sales").await.unwrap();
    session.generate("top three sales again").await.unwrap();

    let requests = generator.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].collection, "sales");
    assert_eq!(requests[0].question, "top three sales");
    assert_eq!(requests[0].fields.len(), 3);
    assert_eq!(requests[0].model.as_deref(), Some("llama3.2:3b"));
    assert_eq!(requests[0].api_key.as_deref(), Some("sk-test"));
    assert_eq!(calls.discover_calls(), 1);
}

#[tokio::test]
async fn test_edit_makes_no_network_call() {
    let session = mock_session();
    let store = sales_store(json!({}));
    let calls = store.calls();
    connected(&session, store);

    session.edit("{\"query\":");
    session.append("  {\"match_all\": {}}}");

    assert_eq!(session.phase(), DraftState::Editing);
    assert_eq!(session.draft().origin(), DraftOrigin::Manual);
    assert_eq!(session.draft().text(), "{\"query\":\n  {\"match_all\": {}}}");
    assert_eq!(calls.execute_calls(), 0);
    assert_eq!(calls.discover_calls(), 0);
}

#[tokio::test]
async fn test_execute_sends_draft_verbatim() {
    let session = mock_session();
    let store = sales_store(bucket_response());
    let calls = store.calls();
    connected(&session, store);

    let text = "{ \"size\": 0,\n\t\"aggs\" :{ }   }";
    session.edit(text);
    session.execute().await.unwrap();

    assert_eq!(calls.executed_queries(), vec![text.to_string()]);
    assert_eq!(session.executed_query().as_deref(), Some(text));
    assert_eq!(session.draft().text(), text);
}

#[tokio::test]
async fn test_ask_then_run_bucket_aggregation() {
    let session = mock_session();
    connected(&session, sales_store(bucket_response()));

    let query = session.generate("average total sales by location").await.unwrap();
    assert!(query.contains("group_by_location"));

    let result = session.execute().await.unwrap();

    assert_eq!(result.shape, "bucket_agg");
    assert_eq!(result.columns, vec!["location_id", "doc_count", "average_total_sales"]);
    let mut berlin = Map::new();
    berlin.insert("location_id".into(), json!("Berlin"));
    berlin.insert("doc_count".into(), json!(30));
    berlin.insert("average_total_sales".into(), json!(12.5));
    assert_eq!(result.rows[0], berlin);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(session.phase(), DraftState::Executed);
}

#[tokio::test]
async fn test_regenerate_replaces_edited_draft() {
    let session = mock_session();
    connected(&session, sales_store(json!({})));

    session.edit("{\"size\": 1}");
    session.generate("count sales").await.unwrap();

    assert_eq!(session.draft().origin(), DraftOrigin::Generated);
    assert!(session.draft().text().contains("track_total_hits"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_execution_is_rejected() {
    let session = mock_session();
    let store = sales_store(bucket_response()).with_delay(Duration::from_secs(1));
    let calls = store.calls();
    connected(&session, store);
    session.edit("{\"size\": 0}");

    let (first, second) = tokio::join!(session.execute(), session.execute());

    assert!(first.is_ok());
    assert!(matches!(second, Err(SearchError::Busy(_))));
    assert_eq!(calls.execute_calls(), 1);
    assert_eq!(session.phase(), DraftState::Executed);
}

#[tokio::test(start_paused = true)]
async fn test_generation_runs_alongside_execution() {
    let session = mock_session();
    let store = sales_store(bucket_response()).with_delay(Duration::from_secs(1));
    let calls = store.calls();
    connected(&session, store);
    session.edit("{\"size\": 0}");

    let (executed, generated) = tokio::join!(session.execute(), session.generate("count sales"));

    assert!(executed.is_ok());
    assert!(generated.is_ok());
    assert_eq!(calls.executed_queries(), vec!["{\"size\": 0}".to_string()]);
    assert!(session.draft().text().contains("track_total_hits"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_generation_is_rejected() {
    let session = mock_session();
    let store = sales_store(bucket_response()).with_delay(Duration::from_secs(1));
    connected(&session, store);

    let (first, second) = tokio::join!(
        session.generate("count sales"),
        session.generate("show sales")
    );

    assert!(first.is_ok());
    assert_eq!(second, Err(SearchError::busy("Query generation")));
    assert_eq!(session.phase(), DraftState::Drafted);
}

#[tokio::test(start_paused = true)]
async fn test_execution_timeout_keeps_draft() {
    let settings = SessionSettings {
        timeouts: es_glance::config::TimeoutConfig {
            execution_secs: 5,
            ..Default::default()
        },
        ..SessionSettings::default()
    };
    let session = super::mock_session_with(settings);
    let slow = sales_store(bucket_response()).with_delay(Duration::from_secs(120));
    connected(&session, slow);
    session.edit("{\"size\": 0}");

    let err = session.execute().await.unwrap_err();

    assert_eq!(err, SearchError::timeout("Query execution", 5));
    assert!(session.results().is_none());
    assert_eq!(session.phase(), DraftState::Error);
    assert_eq!(session.draft().text(), "{\"size\": 0}");
}

#[tokio::test(start_paused = true)]
async fn test_execution_abandoned_on_reconnect() {
    let session = mock_session();
    let slow = sales_store(bucket_response()).with_delay(Duration::from_secs(10));
    connected(&session, slow);
    session.edit("{\"size\": 0}");

    let reconnect = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.attach(Connection::new("http://other:9200"), Arc::new(sales_store(json!({}))));
    };
    let (result, ()) = tokio::join!(session.execute(), reconnect);

    assert!(matches!(result, Err(SearchError::Stale(_))));
    assert!(session.results().is_none());
}

#[tokio::test]
async fn test_remote_error_lands_in_error_slot() {
    let session = mock_session();
    let failing = FailingSearchClient::new(SearchError::remote(
        400,
        "parsing_exception: Unknown key for a START_OBJECT in [bogus].",
    ));
    session.attach(Connection::new("http://es:9200"), Arc::new(failing));
    session.select_collection("sales").unwrap();
    session.edit("{\"bogus\": {}}");

    let err = session.execute().await.unwrap_err();

    assert_eq!(err.category(), "Remote Error");
    assert!(err.to_string().contains("Unknown key"));
    assert_eq!(session.last_error(), Some(err));

    session.clear_error();
    assert_eq!(session.last_error(), None);
}

#[tokio::test]
async fn test_successful_run_clears_error_slot() {
    let session = mock_session();
    connected(&session, sales_store(bucket_response()));

    session.execute().await.unwrap_err();
    assert!(session.last_error().is_some());

    session.edit("{\"size\": 0}");
    session.execute().await.unwrap();
    assert_eq!(session.last_error(), None);
}

#[tokio::test]
async fn test_flatten_applies_to_next_run() {
    let session = mock_session();
    let response = json!({
        "hits": {"total": {"value": 1, "relation": "eq"}, "hits": [
            {"_id": "1", "_source": {"customer": {"city": "Lyon"}}}
        ]}
    });
    connected(&session, sales_store(response));
    session.edit("{}");

    let flat = session.execute().await.unwrap();
    assert_eq!(flat.columns, vec!["_id", "customer.city"]);

    session.set_flatten(false);
    let nested = session.execute().await.unwrap();
    assert_eq!(nested.columns, vec!["_id", "customer"]);
    assert_eq!(nested.rows[0]["customer"], json!({"city": "Lyon"}));
    assert_eq!(session.export().unwrap().file_name, "sales_1rows_original.csv");
}

#[tokio::test]
async fn test_display_limit_caps_visible_rows() {
    let hits: Vec<Value> = (0..5)
        .map(|i| json!({"_id": i.to_string(), "_source": {"n": i}}))
        .collect();
    let response = json!({"hits": {"total": {"value": 5, "relation": "eq"}, "hits": hits}});
    let settings = SessionSettings {
        display_limit: 2,
        ..SessionSettings::default()
    };
    let session = super::mock_session_with(settings);
    connected(&session, sales_store(response));
    session.edit("{}");

    let result = session.execute().await.unwrap();

    assert_eq!(result.rows.len(), 5);
    assert_eq!(result.display_rows().len(), 2);
    assert_eq!(result.summary, "Showing 2 of 5 documents (5 matched)");
    assert_eq!(session.export().unwrap().document.row_count(), 5);
}

#[tokio::test]
async fn test_malformed_edit_keeps_results_and_phase() {
    let session = mock_session();
    let store = sales_store(bucket_response());
    let calls = store.calls();
    connected(&session, store);
    session.edit("{\"size\": 0}");
    session.execute().await.unwrap();

    session.append(", \"aggs\": {");
    let err = session.execute().await.unwrap_err();

    assert!(matches!(err, SearchError::Validation(_)));
    assert_eq!(session.phase(), DraftState::Editing);
    assert_eq!(session.results().unwrap().shape, "bucket_agg");
    assert_eq!(calls.execute_calls(), 1);
}
