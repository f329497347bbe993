//! Plain-text rendering of command output.

use crate::commands::output::CommandOutput;

/// Widest a table column may grow before cells are truncated.
const MAX_COLUMN_WIDTH: usize = 40;

/// Renders output as text, one trailing newline per block.
pub fn render(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Info(msg) => format!("{}\n", msg),
        CommandOutput::Error(msg) => format!("Error: {}\n", msg),
        CommandOutput::Text(text) => format!("{}\n", text),
        CommandOutput::Table { headers, rows } => render_table(headers, rows),
        CommandOutput::Control(_) | CommandOutput::None => String::new(),
        CommandOutput::Multiple(outputs) => outputs.iter().map(render).collect(),
    }
}

/// Renders a table with a header separator.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell_text(cell)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let format_row = |row: &[String]| -> String {
        widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad(&truncate(cell, *width), *width)
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = format_row(headers);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out
}

fn cell_text(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}
