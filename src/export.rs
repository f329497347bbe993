//! CSV export of normalized rows.
//!
//! A field is quoted only when it contains a comma, a double quote or a
//! line break; inner quotes are doubled.

use std::path::Path;

use tracing::info;

use crate::error::{Result, SearchError};
use crate::results::{column_union, display_value, NormalizedRow};

/// Header and encoded lines of a CSV document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDocument {
    /// Column names in first-seen order.
    pub header: Vec<String>,
    /// One encoded line per row, without terminators.
    pub lines: Vec<String>,
}

impl ExportDocument {
    /// Builds the document for `rows`.
    pub fn from_rows(rows: &[NormalizedRow]) -> Self {
        let header = column_union(rows);
        let lines = rows
            .iter()
            .map(|row| {
                let fields: Vec<String> = header
                    .iter()
                    .map(|column| row.get(column).map(display_value).unwrap_or_default())
                    .collect();
                encode_line(&fields)
            })
            .collect();

        Self { header, lines }
    }

    pub fn row_count(&self) -> usize {
        self.lines.len()
    }

    /// Joins header and lines, each terminated by `\n`.
    pub fn to_text(&self) -> String {
        if self.header.is_empty() {
            return String::new();
        }

        let mut out = encode_line(&self.header);
        out.push('\n');
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Writes the document to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text()).map_err(|e| {
            SearchError::internal(format!("Failed to write {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), rows = self.row_count(), "Exported CSV");
        Ok(())
    }
}

/// Encodes rows as CSV text.
pub fn encode(rows: &[NormalizedRow]) -> String {
    ExportDocument::from_rows(rows).to_text()
}

/// Escapes one field.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn encode_line(fields: &[String]) -> String {
    // A lone empty field would otherwise be a blank line, which readers skip
    if let [only] = fields {
        if only.is_empty() {
            return "\"\"".to_string();
        }
    }

    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Suggested file name: `<collection>_<rowCount>rows_<flatten|original>.csv`.
pub fn export_file_name(collection: Option<&str>, row_count: usize, flatten: bool) -> String {
    let collection = match collection.map(str::trim) {
        Some(name) if !name.is_empty() => name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        _ => "all".to_string(),
    };
    let mode = if flatten { "flatten" } else { "original" };
    format!("{collection}_{row_count}rows_{mode}.csv")
}
