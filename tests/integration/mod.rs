//! Integration tests for es-glance.

pub mod command_test;
pub mod export_test;
pub mod schema_test;
pub mod session_test;

use std::sync::Arc;

use es_glance::llm::{LlmQueryGenerator, MockLlmClient};
use es_glance::search::{FieldDescriptor, MockSearchClient};
use es_glance::session::{Session, SessionSettings};
use serde_json::{json, Value};

/// Session whose generator is the canned mock LLM.
pub fn mock_session() -> Session {
    mock_session_with(SessionSettings::default())
}

pub fn mock_session_with(settings: SessionSettings) -> Session {
    let generator = LlmQueryGenerator::with_client(Arc::new(MockLlmClient::new()));
    Session::new(Arc::new(generator), settings)
}

pub fn sales_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("location", "keyword"),
        FieldDescriptor::new("total_sales", "double"),
        FieldDescriptor::new("sold_at", "date"),
    ]
}

/// Terms aggregation over locations with an average sub-aggregation.
pub fn bucket_response() -> Value {
    json!({
        "took": 3,
        "hits": {"total": {"value": 42, "relation": "eq"}, "hits": []},
        "aggregations": {
            "group_by_location": {
                "buckets": [
                    {"key": "Berlin", "doc_count": 30, "average_total_sales": {"value": 12.5}},
                    {"key": "Paris", "doc_count": 12, "average_total_sales": {"value": 8.0}}
                ]
            }
        }
    })
}

/// Store with a `sales` collection answering every query with `response`.
pub fn sales_store(response: Value) -> MockSearchClient {
    MockSearchClient::new()
        .with_collection("sales", sales_fields())
        .with_collection("orders", vec![FieldDescriptor::new("order_id", "keyword")])
        .with_response(response)
}

/// Parses CSV text into records, header included.
pub fn decode_csv(text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
