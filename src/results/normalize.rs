//! Conversion of classified responses into uniform rows.

use serde_json::{Map, Value};
use tracing::debug;

use crate::results::shape::{classify, scalar_value, Bucket, ResultShape};
use crate::results::{column_union, display_value, NormalizedResult, NormalizedRow, DISPLAY_LIMIT};
use crate::search::RawResultEnvelope;

/// Bucket entries that describe the bucket rather than a sub-aggregation.
const BUCKET_RESERVED_KEYS: &[&str] = &[
    "key",
    "key_as_string",
    "doc_count",
    "from",
    "from_as_string",
    "to",
    "to_as_string",
];

/// Number of buckets previewed in the summary.
const BUCKET_PREVIEW: usize = 3;

/// Normalizes an envelope with the default display limit.
pub fn normalize(envelope: &RawResultEnvelope) -> NormalizedResult {
    normalize_with_limit(envelope, DISPLAY_LIMIT)
}

/// Normalizes an envelope into rows plus a summary.
///
/// Never fails: anything that cannot be interpreted ends up as a single
/// row holding the raw aggregations.
pub fn normalize_with_limit(envelope: &RawResultEnvelope, display_limit: usize) -> NormalizedResult {
    let shape = classify(envelope);
    let kind = shape.kind();

    let (rows, summary) = match shape {
        ResultShape::Hits(hits) => {
            let rows: Vec<NormalizedRow> = hits.to_vec();
            let shown = rows.len().min(display_limit);
            let mut summary = format!("Showing {} of {} documents", shown, rows.len());
            if let Some(total) = envelope.metadata.total_display() {
                summary.push_str(&format!(" ({} matched)", total));
            }
            (rows, summary)
        }
        ResultShape::BucketAgg { name, buckets } => bucket_rows(name, &buckets),
        ResultShape::ScalarAgg { name, value } => {
            let mut row = NormalizedRow::new();
            row.insert("metric".to_string(), Value::String(name.to_string()));
            row.insert("value".to_string(), value.clone());
            let summary = format!("{} = {}", name, display_value(value));
            (vec![row], summary)
        }
        ResultShape::UnknownAgg(aggs) => {
            let mut row = NormalizedRow::new();
            row.insert(
                "aggregations".to_string(),
                Value::String(Value::Object(aggs.clone()).to_string()),
            );
            (
                vec![row],
                "Unrecognized aggregation shape; showing raw aggregations".to_string(),
            )
        }
        ResultShape::Empty => (Vec::new(), "No results".to_string()),
    };

    debug!(shape = kind, rows = rows.len(), "Normalized result");

    NormalizedResult {
        columns: column_union(&rows),
        total_rows: rows.len(),
        rows,
        summary,
        shape: kind,
        display_limit,
        metadata: envelope.metadata.clone(),
    }
}

/// Derives the key column name from the aggregation name.
///
/// `group_by_location` and `by_location` become `location_id`; names
/// without a grouping prefix are used as they are.
pub fn key_column(agg_name: &str) -> String {
    let stem = agg_name
        .strip_prefix("group_by_")
        .or_else(|| agg_name.strip_prefix("by_"));

    match stem {
        Some(stem) if !stem.is_empty() => {
            if stem.ends_with("_id") {
                stem.to_string()
            } else {
                format!("{stem}_id")
            }
        }
        _ => agg_name.to_string(),
    }
}

fn bucket_rows(name: &str, buckets: &[Bucket<'_>]) -> (Vec<NormalizedRow>, String) {
    let mut key_name = key_column(name);
    let collides = key_name == "doc_count"
        || buckets.iter().any(|b| {
            b.body.contains_key(&key_name) && !BUCKET_RESERVED_KEYS.contains(&key_name.as_str())
        });
    if collides {
        key_name = "key".to_string();
    }

    let mut metric_column: Option<String> = None;
    let rows: Vec<NormalizedRow> = buckets
        .iter()
        .map(|bucket| {
            let mut row = NormalizedRow::new();
            row.insert(key_name.clone(), bucket.key.clone());
            row.insert(
                "doc_count".to_string(),
                bucket.body.get("doc_count").cloned().unwrap_or(Value::Null),
            );
            for (sub_name, value) in sub_metrics(bucket.body) {
                if metric_column.is_none() {
                    metric_column = Some(sub_name.clone());
                }
                row.insert(sub_name, value);
            }
            row
        })
        .collect();

    let preview_column = metric_column.unwrap_or_else(|| "doc_count".to_string());
    let preview: Vec<String> = rows
        .iter()
        .take(BUCKET_PREVIEW)
        .map(|row| {
            format!(
                "{}: {}",
                row.get(&key_name).map(display_value).unwrap_or_default(),
                row.get(&preview_column).map(display_value).unwrap_or_default()
            )
        })
        .collect();

    let mut summary = format!("{} buckets in '{}'", rows.len(), name);
    if !preview.is_empty() {
        summary.push_str(": ");
        summary.push_str(&preview.join(", "));
        if rows.len() > BUCKET_PREVIEW {
            summary.push_str(", …");
        }
    }

    (rows, summary)
}

/// Single-value sub-aggregations of a bucket, in bucket order.
fn sub_metrics(bucket: &Map<String, Value>) -> Vec<(String, Value)> {
    bucket
        .iter()
        .filter(|(name, _)| !BUCKET_RESERVED_KEYS.contains(&name.as_str()))
        .filter_map(|(name, agg)| Some((name.clone(), scalar_value(agg)?.clone())))
        .collect()
}
