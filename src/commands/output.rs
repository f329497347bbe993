//! Transport-agnostic command output types.
//!
//! Command results are kept independent of how they are printed, so the
//! interactive loop and scripted runs share one renderer.

/// Output from a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Informational message (success, status, etc.).
    Info(String),

    /// Error message.
    Error(String),

    /// Preformatted text shown as-is (query drafts, field lists).
    Text(String),

    /// Structured table data for display.
    Table {
        /// Column headers.
        headers: Vec<String>,
        /// Row data (each row is a vector of cell values).
        rows: Vec<Vec<String>>,
    },

    /// Application control action.
    Control(ControlAction),

    /// Multiple outputs (for commands that produce several messages).
    Multiple(Vec<CommandOutput>),

    /// Nothing to show.
    None,
}

/// Control actions that affect the command loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Exit the application.
    Exit,
}

impl CommandOutput {
    /// Creates an info message.
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    /// Creates an error message.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Creates a preformatted text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a table output.
    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table { headers, rows }
    }

    /// Creates a multiple output from a vector.
    pub fn multiple(outputs: Vec<CommandOutput>) -> Self {
        Self::Multiple(outputs)
    }

    /// Creates an exit control action.
    pub fn exit() -> Self {
        Self::Control(ControlAction::Exit)
    }

    /// True if this output (or any nested output) is an error.
    pub fn is_error(&self) -> bool {
        match self {
            Self::Error(_) => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_error),
            _ => false,
        }
    }

    /// True if this output asks the loop to exit.
    pub fn is_exit(&self) -> bool {
        match self {
            Self::Control(ControlAction::Exit) => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_exit),
            _ => false,
        }
    }
}
