//! Connection command handlers (/connect, /indices, /use, /fields).

use super::{error_output, CommandContext};
use crate::commands::output::CommandOutput;
use crate::commands::router::ConnectArgs;
use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::error::{Result, SearchError};
use crate::search::{format_fields, FieldDescriptor};

/// Resolves `/connect` arguments to a connection.
///
/// A URL connects directly; anything else names a configured connection.
fn resolve_connection(ctx: &CommandContext<'_>, args: &ConnectArgs) -> Result<Connection> {
    let mut config = if args.url.contains("://") {
        ConnectionConfig::from_url(&args.url)?
    } else {
        ctx.config
            .get_connection(Some(&args.url))
            .cloned()
            .ok_or_else(|| {
                SearchError::config(format!(
                    "No connection named '{}' in the config file",
                    args.url
                ))
            })?
    };

    if args.username.is_some() {
        config.username = args.username.clone();
        config.password = args.password.clone();
    }

    Connection::from_config(&config)
}

/// Handle /connect command.
pub fn handle_connect(ctx: &CommandContext<'_>, args: &ConnectArgs) -> CommandOutput {
    let result = resolve_connection(ctx, args).and_then(|connection| {
        let display = connection.display_string();
        ctx.session.connect(connection)?;
        Ok(display)
    });

    match result {
        Ok(display) => CommandOutput::info(format!("Connected to {}", display)),
        Err(e) => error_output(&e),
    }
}

/// Handle /indices command.
pub async fn handle_indices(ctx: &CommandContext<'_>) -> CommandOutput {
    match ctx.session.list_collections().await {
        Ok(collections) if collections.is_empty() => CommandOutput::info("No collections found."),
        Ok(collections) => {
            let rows = collections.into_iter().map(|c| vec![c]).collect();
            CommandOutput::table(vec!["collection".to_string()], rows)
        }
        Err(e) => error_output(&e),
    }
}

/// Handle /use command.
pub fn handle_use(ctx: &CommandContext<'_>, collection: &str) -> CommandOutput {
    match ctx.session.select_collection(collection) {
        Ok(()) => CommandOutput::info(format!("Using collection '{}'", collection.trim())),
        Err(e) => error_output(&e),
    }
}

/// Handle /disconnect command.
pub fn handle_disconnect(ctx: &CommandContext<'_>) -> CommandOutput {
    match ctx.session.disconnect() {
        Some(target) => CommandOutput::info(format!("Disconnected from {}", target)),
        None => CommandOutput::info("Not connected."),
    }
}

/// Handle /fields command.
///
/// Without arguments shows the selected collection's fields. With
/// collection names, discovers them concurrently and reports each one.
pub async fn handle_fields(ctx: &CommandContext<'_>, collections: &[String]) -> CommandOutput {
    if collections.is_empty() {
        return match ctx.session.fields().await {
            Ok(fields) => fields_output(&fields),
            Err(e) => error_output(&e),
        };
    }

    let outputs = ctx
        .session
        .prefetch_fields(collections)
        .await
        .into_iter()
        .map(|(collection, result)| match result {
            Ok(fields) => CommandOutput::info(format!("{}: {} fields", collection, fields.len())),
            Err(e) => {
                let output = CommandOutput::error(format!(
                    "{}: {}: {}",
                    collection,
                    e.category(),
                    e
                ));
                ctx.session.report(e);
                output
            }
        })
        .collect();
    CommandOutput::multiple(outputs)
}

fn fields_output(fields: &[FieldDescriptor]) -> CommandOutput {
    if fields.is_empty() {
        return CommandOutput::info("No fields discovered.");
    }
    CommandOutput::text(format!(
        "{} fields:\n{}",
        fields.len(),
        format_fields(fields).trim_end()
    ))
}
