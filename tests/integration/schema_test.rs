//! Schema cache integration tests.
//!
//! Discovery is counted on the mock store to check caching and reconnects.

use std::sync::Arc;
use std::time::Duration;

use es_glance::connection::Connection;
use es_glance::error::SearchError;
use es_glance::search::{FieldDescriptor, MockSearchClient};

use super::{mock_session, sales_fields, sales_store};
use serde_json::json;

#[tokio::test]
async fn test_fields_discovered_once_per_connection() {
    let session = mock_session();
    let store = sales_store(json!({}));
    let calls = store.calls();
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    session.select_collection("sales").unwrap();

    let first = session.fields().await.unwrap();
    let second = session.fields().await.unwrap();

    assert_eq!(calls.discover_calls(), 1);
    assert_eq!(first.to_vec(), sales_fields());
    assert_eq!(first, second);
    assert_eq!(session.cached_schemas(), 1);
}

#[tokio::test]
async fn test_reconnect_invalidates_cache() {
    let session = mock_session();
    let store = sales_store(json!({}));
    let calls = store.calls();
    session.attach(Connection::new("http://es:9200"), Arc::new(store.clone()));
    session.select_collection("sales").unwrap();
    session.fields().await.unwrap();

    // Same endpoint, so only the invalidation can force a new discovery
    session.attach(Connection::new("http://es:9200"), Arc::new(store));

    assert_eq!(session.cached_schemas(), 0);
    assert_eq!(session.collection().as_deref(), Some("sales"));

    session.fields().await.unwrap();
    assert_eq!(calls.discover_calls(), 2);
}

#[tokio::test]
async fn test_reconnect_sees_new_schema() {
    let session = mock_session();
    session.attach(Connection::new("http://old:9200"), Arc::new(sales_store(json!({}))));
    session.select_collection("sales").unwrap();
    session.fields().await.unwrap();

    let renamed = MockSearchClient::new()
        .with_collection("sales", vec![FieldDescriptor::new("revenue", "double")]);
    session.attach(Connection::new("http://new:9200"), Arc::new(renamed));

    let fields = session.fields().await.unwrap();
    assert_eq!(fields.to_vec(), vec![FieldDescriptor::new("revenue", "double")]);
}

#[tokio::test]
async fn test_failed_discovery_is_not_cached() {
    let session = mock_session();
    let store = MockSearchClient::new().with_failing_collection("broken");
    let calls = store.calls();
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    session.select_collection("broken").unwrap();

    let err = session.fields().await.unwrap_err();
    assert!(matches!(err, SearchError::Remote { status: 500, .. }));
    assert_eq!(session.last_error(), Some(err));

    session.fields().await.unwrap_err();
    assert_eq!(calls.discover_calls(), 2);
    assert_eq!(session.cached_schemas(), 0);
}

#[tokio::test]
async fn test_prefetch_isolates_failures() {
    let session = mock_session();
    let store = sales_store(json!({})).with_failing_collection("broken");
    session.attach(Connection::new("http://es:9200"), Arc::new(store));

    let collections = vec!["sales".to_string(), "broken".to_string(), "orders".to_string()];
    let results = session.prefetch_fields(&collections).await;

    let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["sales", "broken", "orders"]);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_err());
    assert!(results[2].1.is_ok());
    assert_eq!(session.cached_schemas(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_discovery_times_out() {
    let session = mock_session();
    let store = sales_store(json!({})).with_delay(Duration::from_secs(30));
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    session.select_collection("sales").unwrap();

    let err = session.fields().await.unwrap_err();

    assert!(matches!(err, SearchError::Timeout { .. }));
    assert_eq!(err.category(), "Timed Out");
    assert_eq!(session.cached_schemas(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_abandoned_on_reconnect() {
    let session = mock_session();
    let slow = sales_store(json!({})).with_delay(Duration::from_secs(5));
    session.attach(Connection::new("http://old:9200"), Arc::new(slow));
    session.select_collection("sales").unwrap();

    let reconnect = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.attach(Connection::new("http://new:9200"), Arc::new(sales_store(json!({}))));
    };
    let (result, ()) = tokio::join!(session.fields(), reconnect);

    assert!(matches!(result, Err(SearchError::Stale(_))));
    assert_eq!(session.cached_schemas(), 0);
}
