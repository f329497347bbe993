//! System command handlers (/help, /status, /quit).

use super::CommandContext;
use crate::commands::help::HELP_TEXT;
use crate::commands::output::CommandOutput;

/// Handle /help command.
pub fn handle_help() -> CommandOutput {
    CommandOutput::text(HELP_TEXT)
}

/// Handle /quit or /exit command.
pub fn handle_quit() -> CommandOutput {
    CommandOutput::exit()
}

/// Handle /status command.
pub fn handle_status(ctx: &CommandContext<'_>) -> CommandOutput {
    let session = ctx.session;

    let connection = session
        .connection_display()
        .unwrap_or_else(|| "not connected".to_string());
    let collection = session.collection().unwrap_or_else(|| "none".to_string());
    let results = match session.results() {
        Some(results) => format!("{} rows ({})", results.total_rows, results.shape),
        None => "none".to_string(),
    };

    let phase = session.phase();
    let mut lines = vec![
        format!("Connection: {}", connection),
        format!("Collection: {}", collection),
        format!("Draft: {}{}", phase, if phase.is_busy() { " (in progress)" } else { "" }),
        format!("Flatten: {}", if session.flatten() { "on" } else { "off" }),
        format!("Cached schemas: {}", session.cached_schemas()),
        format!("Results: {}", results),
    ];
    if let Some(error) = session.last_error() {
        lines.push(format!("Last error: {}", error));
    }

    CommandOutput::text(lines.join("\n"))
}

/// Handle unknown command.
pub fn handle_unknown(command: &str) -> CommandOutput {
    CommandOutput::error(format!(
        "Unknown command: {}. Type /help for available commands.",
        command
    ))
}
