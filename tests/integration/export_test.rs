//! CSV export integration tests.

use std::sync::Arc;

use es_glance::connection::Connection;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{decode_csv, mock_session, sales_store};

#[tokio::test]
async fn test_export_quotes_and_decodes_back() {
    let session = mock_session();
    let response = json!({
        "hits": {"total": {"value": 2, "relation": "eq"}, "hits": [
            {"_id": "a", "_source": {"name": "Smith, Jane", "note": "said \"hi\""}},
            {"_id": "b", "_source": {"name": "Lee", "tags": ["x", "y"]}}
        ]}
    });
    session.attach(Connection::new("http://es:9200"), Arc::new(sales_store(response)));
    session.select_collection("sales").unwrap();
    session.edit("{}");
    session.execute().await.unwrap();

    let artifact = session.export().unwrap();
    let text = artifact.document.to_text();

    assert_eq!(
        text,
        "_id,name,note,tags\n\
         a,\"Smith, Jane\",\"said \"\"hi\"\"\",\n\
         b,Lee,,\"[\"\"x\"\",\"\"y\"\"]\"\n"
    );
    assert_eq!(
        decode_csv(&text),
        vec![
            vec!["_id", "name", "note", "tags"],
            vec!["a", "Smith, Jane", "said \"hi\"", ""],
            vec!["b", "Lee", "", "[\"x\",\"y\"]"],
        ]
    );
    assert_eq!(artifact.file_name, "sales_2rows_flatten.csv");
}

#[tokio::test]
async fn test_export_without_collection_uses_all() {
    let session = mock_session();
    let response = json!({"aggregations": {"max_price": {"value": 99}}});
    session.attach(Connection::new("http://es:9200"), Arc::new(sales_store(response)));
    session.edit("{\"size\": 0}");
    session.execute().await.unwrap();

    let artifact = session.export().unwrap();

    assert_eq!(artifact.file_name, "all_1rows_flatten.csv");
    assert_eq!(artifact.document.to_text(), "metric,value\nmax_price,99\n");
}
