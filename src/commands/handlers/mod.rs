//! Command handlers for es-glance.
//!
//! Each handler runs one command against the session and turns the outcome,
//! success or failure, into a `CommandOutput`.

pub mod connection;
pub mod queries;
pub mod system;

use crate::commands::output::CommandOutput;
use crate::commands::router::Command;
use crate::config::Config;
use crate::error::SearchError;
use crate::session::Session;

/// Context provided to command handlers.
pub struct CommandContext<'a> {
    /// The session commands act on.
    pub session: &'a Session,
    /// Loaded configuration, for named connections.
    pub config: &'a Config,
}

impl<'a> CommandContext<'a> {
    pub fn new(session: &'a Session, config: &'a Config) -> Self {
        Self { session, config }
    }
}

/// Formats an error for display.
pub(crate) fn error_output(error: &SearchError) -> CommandOutput {
    CommandOutput::error(format!("{}: {}", error.category(), error))
}

/// Runs one parsed command.
pub async fn dispatch(ctx: &CommandContext<'_>, command: Command) -> CommandOutput {
    match command {
        Command::Connect(args) => connection::handle_connect(ctx, &args),
        Command::Indices => connection::handle_indices(ctx).await,
        Command::Use(collection) => connection::handle_use(ctx, &collection),
        Command::Disconnect => connection::handle_disconnect(ctx),
        Command::Fields(collections) => connection::handle_fields(ctx, &collections).await,
        Command::Sample(size) => queries::handle_sample(ctx, size).await,
        Command::Ask(question) => queries::handle_ask(ctx, &question).await,
        Command::Edit(text) => queries::handle_edit(ctx, &text),
        Command::Append(text) => queries::handle_append(ctx, &text),
        Command::Show => queries::handle_show(ctx),
        Command::Run => queries::handle_run(ctx).await,
        Command::Flatten(on) => queries::handle_flatten(ctx, on),
        Command::Export(path) => queries::handle_export(ctx, path.as_deref()),
        Command::Status => system::handle_status(ctx),
        Command::Help => system::handle_help(),
        Command::Quit => system::handle_quit(),
        Command::Empty => CommandOutput::None,
        Command::Invalid(usage) => CommandOutput::error(usage),
        Command::Unknown(name) => system::handle_unknown(&name),
    }
}
