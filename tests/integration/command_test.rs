//! Command-line driven integration tests.
//!
//! Lines go through the same router and renderer the interactive loop uses.

use std::sync::Arc;

use es_glance::commands::{render, run_line, CommandContext, CommandOutput};
use es_glance::config::Config;
use es_glance::connection::Connection;
use es_glance::session::DraftState;
use serde_json::json;

use super::{bucket_response, mock_session, sales_store};

#[tokio::test]
async fn test_ask_run_export_flow() {
    let session = mock_session();
    let store = sales_store(bucket_response());
    let calls = store.calls();
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    let output = run_line(&ctx, "/use sales").await;
    assert_eq!(output, CommandOutput::info("Using collection 'sales'"));

    let output = run_line(&ctx, "average total sales by location").await;
    assert!(!output.is_error(), "{}", render(&output));
    assert!(render(&output).contains("group_by_location"));
    assert_eq!(session.phase(), DraftState::Drafted);

    let output = run_line(&ctx, "/run").await;
    let text = render(&output);
    assert!(text.starts_with("location_id | doc_count | average_total_sales\n"));
    assert!(text.contains("Berlin"));
    assert!(text.contains("2 buckets in 'group_by_location'"));
    assert!(text.contains("took 3 ms, 42 matched"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("by_location.csv");
    let output = run_line(&ctx, &format!("/export {}", path.display())).await;
    assert_eq!(
        output,
        CommandOutput::info(format!("Exported 2 rows to {}", path.display()))
    );

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "location_id,doc_count,average_total_sales\nBerlin,30,12.5\nParis,12,8.0\n"
    );
    assert_eq!(calls.execute_calls(), 1);
}

#[tokio::test]
async fn test_manual_edit_then_run() {
    let session = mock_session();
    let store = sales_store(json!({
        "took": 1,
        "aggregations": {"avg_price": {"value": 17.25}}
    }));
    let calls = store.calls();
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    run_line(&ctx, "/use sales").await;
    run_line(&ctx, "/edit {\"size\": 0, \"aggs\": {").await;
    run_line(&ctx, "/append \"avg_price\": {\"avg\": {\"field\": \"price\"}}}}").await;

    let output = run_line(&ctx, "/show").await;
    assert_eq!(
        output,
        CommandOutput::text(
            "{\"size\": 0, \"aggs\": {\n\"avg_price\": {\"avg\": {\"field\": \"price\"}}}}"
        )
    );

    let text = render(&run_line(&ctx, "/run").await);
    assert!(text.contains("avg_price = 17.25"));
    assert_eq!(calls.executed_queries().len(), 1);
    assert!(calls.executed_queries()[0].ends_with("\"price\"}}}}"));
}

#[tokio::test]
async fn test_errors_are_reported_not_fatal() {
    let session = mock_session();
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    let output = run_line(&ctx, "/run").await;
    assert_eq!(
        output,
        CommandOutput::error("Validation Error: Validation error: Query draft is empty")
    );

    let output = run_line(&ctx, "show me everything").await;
    assert!(output.is_error());

    let output = run_line(&ctx, "/export").await;
    assert!(render(&output).starts_with("Error: Validation Error"));

    let output = run_line(&ctx, "/frobnicate").await;
    assert!(output.is_error());

    let status = render(&run_line(&ctx, "/status").await);
    assert!(status.contains("Connection: not connected"));
    assert!(status.contains("Last error:"));
}

#[tokio::test]
async fn test_indices_lists_collections() {
    let session = mock_session();
    session.attach(
        Connection::new("http://es:9200"),
        Arc::new(sales_store(json!({}))),
    );
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    let output = run_line(&ctx, "/indices").await;

    assert_eq!(
        output,
        CommandOutput::table(
            vec!["collection".to_string()],
            vec![vec!["sales".to_string()], vec!["orders".to_string()]],
        )
    );
}

#[tokio::test]
async fn test_connect_unknown_name() {
    let session = mock_session();
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    let output = run_line(&ctx, "/connect staging").await;

    assert!(render(&output).contains("No connection named 'staging'"));
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_quit_exits() {
    let session = mock_session();
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    assert!(run_line(&ctx, "/quit").await.is_exit());
    assert!(run_line(&ctx, "/exit").await.is_exit());
}

#[tokio::test]
async fn test_export_name_follows_executed_query() {
    let session = mock_session();
    session.attach(
        Connection::new("http://es:9200"),
        Arc::new(sales_store(bucket_response())),
    );
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    run_line(&ctx, "/use sales").await;
    run_line(&ctx, "/edit {\"size\": 0}").await;
    run_line(&ctx, "/run").await;
    run_line(&ctx, "/flatten off").await;
    run_line(&ctx, "/use orders").await;

    let artifact = session.export().unwrap();
    assert_eq!(artifact.file_name, "sales_2rows_flatten.csv");
}

#[tokio::test]
async fn test_sample_shows_documents() {
    let session = mock_session();
    let store = sales_store(json!({
        "took": 2,
        "hits": {"total": {"value": 120, "relation": "eq"}, "hits": [
            {"_id": "1", "_source": {"location": "Berlin"}},
            {"_id": "2", "_source": {"location": "Paris"}}
        ]}
    }));
    let calls = store.calls();
    session.attach(Connection::new("http://es:9200"), Arc::new(store));
    let config = Config::default();
    let ctx = CommandContext::new(&session, &config);

    let output = run_line(&ctx, "/sample").await;
    assert_eq!(
        output,
        CommandOutput::error("Validation Error: Validation error: No collection selected")
    );

    run_line(&ctx, "/use sales").await;
    let text = render(&run_line(&ctx, "/sample 2").await);

    assert!(text.contains("Berlin"));
    assert!(text.contains("Showing 2 documents from sales\n"));
    assert_eq!(calls.executed_queries(), vec!["{\"size\":2}".to_string()]);

    let output = run_line(&ctx, "/sample 500").await;
    assert!(render(&output).contains("between 1 and 200"));
}
