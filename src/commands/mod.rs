//! Command parsing and dispatch for es-glance.
//!
//! Parsing is kept apart from execution so commands can be unit tested
//! without a search store.

pub mod handlers;
pub mod help;
pub mod output;
pub mod render;
pub mod router;

pub use handlers::{dispatch, CommandContext};
pub use output::{CommandOutput, ControlAction};
pub use render::render;
pub use router::{Command, CommandRouter, ConnectArgs};

/// Parses and runs one line of input.
pub async fn run_line(ctx: &CommandContext<'_>, line: &str) -> CommandOutput {
    dispatch(ctx, CommandRouter::parse(line)).await
}
