//! Result normalization for es-glance.
//!
//! Turns whatever shape the store answered with into one row-and-column
//! contract shared by the table view and CSV export.

mod normalize;
mod shape;

pub use normalize::{key_column, normalize, normalize_with_limit};
pub use shape::{classify, Bucket, ResultShape};

use serde_json::{Map, Value};

use crate::search::ResultMetadata;

/// Maximum number of rows shown on screen.
pub const DISPLAY_LIMIT: usize = 50;

/// One row: column name to value. Missing columns render as empty.
pub type NormalizedRow = Map<String, Value>;

/// Normalized rows plus everything needed to present them.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    /// All rows, including those beyond the display limit.
    pub rows: Vec<NormalizedRow>,
    /// Union of row keys in first-seen order.
    pub columns: Vec<String>,
    /// Human-readable summary.
    pub summary: String,
    /// Which shape the envelope was classified as.
    pub shape: &'static str,
    /// Total number of rows produced.
    pub total_rows: usize,
    /// Rows shown on screen.
    pub display_limit: usize,
    /// Execution metadata carried over from the envelope.
    pub metadata: ResultMetadata,
}

impl NormalizedResult {
    /// Returns the rows within the display limit.
    pub fn display_rows(&self) -> &[NormalizedRow] {
        &self.rows[..self.rows.len().min(self.display_limit)]
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Union of keys across rows, in first-seen order.
pub fn column_union(rows: &[NormalizedRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Formats a value for a table cell or CSV field.
///
/// Strings are shown without quotes, null as empty, nested values as
/// compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
