//! Search store payload types.
//!
//! Field descriptors returned by schema discovery and the raw result
//! envelope returned by query execution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single document hit, as a column-name to value mapping.
pub type Document = Map<String, Value>;

/// One discovered field of a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    /// Field name (dotted for nested fields, e.g. "customer.address.city").
    pub name: String,

    /// Store data type (e.g. "keyword", "long", "date").
    pub data_type: String,

    /// Raw mapping metadata, kept opaque.
    #[serde(default)]
    pub raw: Value,
}

impl FieldDescriptor {
    /// Creates a field descriptor with no raw metadata.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            raw: Value::Null,
        }
    }

    /// Attaches raw mapping metadata.
    pub fn with_raw(self, raw: Value) -> Self {
        Self { raw, ..self }
    }
}

/// Qualifier on the total-matched count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRelation {
    /// The count is exact.
    #[serde(rename = "eq")]
    Exact,
    /// The count is a lower bound.
    #[serde(rename = "gte")]
    AtLeast,
}

impl MatchRelation {
    /// Parses the store's relation marker.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Exact),
            "gte" => Some(Self::AtLeast),
            _ => None,
        }
    }
}

/// Execution metadata from a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Time the store spent executing the query.
    pub elapsed_ms: Option<u64>,

    /// Number of documents matched by the query.
    pub total_matched: Option<u64>,

    /// Whether `total_matched` is exact or a lower bound.
    pub match_relation: Option<MatchRelation>,
}

impl ResultMetadata {
    /// Formats the total-matched count with its relation qualifier.
    pub fn total_display(&self) -> Option<String> {
        let total = self.total_matched?;
        Some(match self.match_relation {
            Some(MatchRelation::AtLeast) => format!("at least {total}"),
            _ => total.to_string(),
        })
    }
}

impl fmt::Display for ResultMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ms) = self.elapsed_ms {
            parts.push(format!("took {ms} ms"));
        }
        if let Some(total) = self.total_display() {
            parts.push(format!("{total} matched"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Raw response from query execution, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultEnvelope {
    /// Document hits.
    #[serde(default)]
    pub hits: Vec<Document>,

    /// Aggregations object, if the query requested any.
    #[serde(default)]
    pub aggregations: Option<Map<String, Value>>,

    /// Execution metadata.
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl RawResultEnvelope {
    /// Builds an envelope from a search response body.
    ///
    /// Each hit becomes `{_id, ...source}`; with `flatten` set, nested
    /// objects in the source become dotted top-level keys. Missing sections
    /// are treated as absent rather than as errors.
    pub fn from_search_response(body: &Value, flatten: bool) -> Self {
        let hits_section = body.get("hits");

        let hits = hits_section
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .map(|hits| hits.iter().map(|hit| document_from_hit(hit, flatten)).collect())
            .unwrap_or_default();

        let (total_matched, match_relation) = match hits_section.and_then(|h| h.get("total")) {
            // Older stores report a bare number
            Some(Value::Number(n)) => (n.as_u64(), Some(MatchRelation::Exact)),
            Some(Value::Object(total)) => (
                total.get("value").and_then(Value::as_u64),
                total
                    .get("relation")
                    .and_then(Value::as_str)
                    .and_then(MatchRelation::parse),
            ),
            _ => (None, None),
        };

        let aggregations = body.get("aggregations").and_then(Value::as_object).cloned();

        Self {
            hits,
            aggregations,
            metadata: ResultMetadata {
                elapsed_ms: body.get("took").and_then(Value::as_u64),
                total_matched,
                match_relation,
            },
        }
    }
}

fn document_from_hit(hit: &Value, flatten: bool) -> Document {
    let mut doc = Document::new();

    if let Some(id) = hit.get("_id") {
        doc.insert("_id".to_string(), id.clone());
    }

    let source = hit
        .get("_source")
        .or_else(|| hit.get("fields"))
        .and_then(Value::as_object);

    if let Some(source) = source {
        if flatten {
            flatten_into(&mut doc, "", source);
        } else {
            doc.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    doc
}

/// Flattens nested objects into dotted keys. Arrays are kept as values.
pub fn flatten_into(out: &mut Document, prefix: &str, object: &Map<String, Value>) {
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, &name, inner),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}
