//! Structural classification of raw search responses.
//!
//! Classification looks only at which keys are present, in a fixed order:
//! hits, bucket aggregation, scalar aggregation, unrecognized aggregation,
//! empty. The first match wins.

use serde_json::{Map, Value};

use crate::search::{Document, RawResultEnvelope};

/// One bucket of a bucket aggregation, with its key resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<'a> {
    /// Bucket key (`key_as_string` preferred over `key`).
    pub key: Value,
    /// The bucket object itself.
    pub body: &'a Map<String, Value>,
}

/// The recognized shape of a raw result envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape<'a> {
    /// One or more document hits.
    Hits(&'a [Document]),
    /// A named aggregation carrying buckets.
    BucketAgg {
        name: &'a str,
        buckets: Vec<Bucket<'a>>,
    },
    /// A single named metric aggregation with a scalar value.
    ScalarAgg { name: &'a str, value: &'a Value },
    /// An aggregations object none of the above matched.
    UnknownAgg(&'a Map<String, Value>),
    /// No hits and no aggregations.
    Empty,
}

impl ResultShape<'_> {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hits(_) => "hits",
            Self::BucketAgg { .. } => "bucket_agg",
            Self::ScalarAgg { .. } => "scalar_agg",
            Self::UnknownAgg(_) => "unknown_agg",
            Self::Empty => "empty",
        }
    }
}

/// Classifies an envelope.
pub fn classify(envelope: &RawResultEnvelope) -> ResultShape<'_> {
    if !envelope.hits.is_empty() {
        return ResultShape::Hits(&envelope.hits);
    }

    let Some(aggs) = envelope.aggregations.as_ref().filter(|a| !a.is_empty()) else {
        return ResultShape::Empty;
    };

    for (name, agg) in aggs {
        if let Some(buckets) = agg.get("buckets").and_then(buckets_of) {
            return ResultShape::BucketAgg {
                name: name.as_str(),
                buckets,
            };
        }
    }

    if aggs.len() == 1 {
        if let Some((name, agg)) = aggs.iter().next() {
            if let Some(value) = scalar_value(agg) {
                return ResultShape::ScalarAgg {
                    name: name.as_str(),
                    value,
                };
            }
        }
    }

    ResultShape::UnknownAgg(aggs)
}

/// Returns the single-value `value` of a metric aggregation, if it has one.
pub(crate) fn scalar_value(agg: &Value) -> Option<&Value> {
    match agg.as_object()?.get("value")? {
        Value::Array(_) | Value::Object(_) => None,
        value => Some(value),
    }
}

/// Reads buckets in either list form or keyed-object form.
fn buckets_of(buckets: &Value) -> Option<Vec<Bucket<'_>>> {
    match buckets {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let body = item.as_object()?;
                let key = body
                    .get("key_as_string")
                    .or_else(|| body.get("key"))
                    .cloned()
                    .unwrap_or(Value::Null);
                Some(Bucket { key, body })
            })
            .collect(),
        Value::Object(keyed) => keyed
            .iter()
            .map(|(key, item)| {
                Some(Bucket {
                    key: Value::String(key.clone()),
                    body: item.as_object()?,
                })
            })
            .collect(),
        _ => None,
    }
}
