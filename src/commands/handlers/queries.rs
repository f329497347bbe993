//! Query command handlers (/ask, /edit, /append, /show, /run, /sample, /flatten, /export).

use std::path::PathBuf;

use super::{error_output, CommandContext};
use crate::commands::output::CommandOutput;
use crate::results::{display_value, NormalizedResult};

/// Handle /ask command or a bare question.
pub async fn handle_ask(ctx: &CommandContext<'_>, question: &str) -> CommandOutput {
    match ctx.session.generate(question).await {
        Ok(query) => CommandOutput::multiple(vec![
            CommandOutput::info("Drafted query (edit with /edit or /append, execute with /run):"),
            CommandOutput::text(query),
        ]),
        Err(e) => error_output(&e),
    }
}

/// Handle /edit command.
pub fn handle_edit(ctx: &CommandContext<'_>, text: &str) -> CommandOutput {
    ctx.session.edit(text);
    CommandOutput::info("Draft replaced.")
}

/// Handle /append command.
pub fn handle_append(ctx: &CommandContext<'_>, text: &str) -> CommandOutput {
    ctx.session.append(text);
    CommandOutput::info("Line appended to draft.")
}

/// Handle /show command.
pub fn handle_show(ctx: &CommandContext<'_>) -> CommandOutput {
    let draft = ctx.session.draft();
    if draft.is_blank() {
        CommandOutput::info("The draft is empty. Ask a question or use /edit.")
    } else {
        CommandOutput::text(draft.text())
    }
}

/// Handle /run command.
pub async fn handle_run(ctx: &CommandContext<'_>) -> CommandOutput {
    match ctx.session.execute().await {
        Ok(result) => result_output(&result),
        Err(e) => error_output(&e),
    }
}

/// Handle /sample command.
pub async fn handle_sample(ctx: &CommandContext<'_>, size: usize) -> CommandOutput {
    match ctx.session.sample(size).await {
        Ok(result) => result_output(&result),
        Err(e) => error_output(&e),
    }
}

/// Handle /flatten command.
pub fn handle_flatten(ctx: &CommandContext<'_>, on: bool) -> CommandOutput {
    ctx.session.set_flatten(on);
    CommandOutput::info(format!(
        "Flatten {}. Takes effect on the next /run.",
        if on { "on" } else { "off" }
    ))
}

/// Handle /export command.
pub fn handle_export(ctx: &CommandContext<'_>, path: Option<&str>) -> CommandOutput {
    let artifact = match ctx.session.export() {
        Ok(artifact) => artifact,
        Err(e) => return error_output(&e),
    };

    let path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));

    match artifact.document.write_to(&path) {
        Ok(()) => CommandOutput::info(format!(
            "Exported {} rows to {}",
            artifact.document.row_count(),
            path.display()
        )),
        Err(e) => {
            let output = error_output(&e);
            ctx.session.report(e);
            output
        }
    }
}

/// Builds the table, summary and metadata lines for a result.
pub fn result_output(result: &NormalizedResult) -> CommandOutput {
    let mut outputs = Vec::new();

    if !result.is_empty() {
        let rows = result
            .display_rows()
            .iter()
            .map(|row| {
                result
                    .columns
                    .iter()
                    .map(|column| row.get(column).map(display_value).unwrap_or_default())
                    .collect()
            })
            .collect();
        outputs.push(CommandOutput::table(result.columns.clone(), rows));
    }

    outputs.push(CommandOutput::info(result.summary.clone()));

    let metadata = result.metadata.to_string();
    if !metadata.is_empty() {
        outputs.push(CommandOutput::info(metadata));
    }

    CommandOutput::multiple(outputs)
}
