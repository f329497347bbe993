//! Command parsing and routing for es-glance.
//!
//! Parses user input into structured commands. Input that does not start
//! with `/` is a natural-language question.

use crate::session::DEFAULT_SAMPLE_SIZE;

/// Arguments for the connect command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectArgs {
    /// Endpoint URL.
    pub url: String,
    /// Username for basic auth.
    pub username: Option<String>,
    /// Password for basic auth.
    pub password: Option<String>,
}

/// Parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to a search store.
    Connect(ConnectArgs),
    /// List collections.
    Indices,
    /// Select a collection.
    Use(String),
    /// Drop the active connection.
    Disconnect,
    /// Show fields of the selected collection, or discover the named ones.
    Fields(Vec<String>),
    /// Fetch the first documents of the selected collection.
    Sample(usize),
    /// Draft a query from a question.
    Ask(String),
    /// Replace the draft text.
    Edit(String),
    /// Append a line to the draft.
    Append(String),
    /// Show the draft.
    Show,
    /// Execute the draft.
    Run,
    /// Toggle flattening of nested fields.
    Flatten(bool),
    /// Export the results as CSV, optionally to a path.
    Export(Option<String>),
    /// Show session status.
    Status,
    /// Show help message.
    Help,
    /// Exit the application.
    Quit,
    /// Blank input.
    Empty,
    /// Malformed arguments for a known command.
    Invalid(String),
    /// Unknown command.
    Unknown(String),
}

/// Command router for parsing user input.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse user input into a Command.
    pub fn parse(input: &str) -> Command {
        let input = input.trim();

        if input.is_empty() {
            return Command::Empty;
        }

        if !input.starts_with('/') {
            return Command::Ask(input.to_string());
        }

        let (command, args) = match input.split_once(char::is_whitespace) {
            Some((command, args)) => (command.to_lowercase(), args.trim()),
            None => (input.to_lowercase(), ""),
        };

        match command.as_str() {
            "/connect" => Self::parse_connect(args),
            "/indices" | "/collections" => Command::Indices,
            "/use" => {
                if args.is_empty() {
                    Command::Invalid("Usage: /use <collection>".to_string())
                } else {
                    Command::Use(args.to_string())
                }
            }
            "/disconnect" => Command::Disconnect,
            "/fields" | "/schema" => Command::Fields(
                args.split_whitespace().map(str::to_string).collect(),
            ),
            "/sample" => Self::parse_sample(args),
            "/ask" => Command::Ask(args.to_string()),
            "/edit" => Command::Edit(args.to_string()),
            "/append" => Command::Append(args.to_string()),
            "/show" => Command::Show,
            "/run" => Command::Run,
            "/flatten" => Self::parse_flatten(args),
            "/export" => Command::Export(Some(args.to_string()).filter(|a| !a.is_empty())),
            "/status" => Command::Status,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Unknown(command),
        }
    }

    /// Parse `/connect <url> [user [password]]`.
    fn parse_connect(args: &str) -> Command {
        let mut parts = args.split_whitespace();
        let Some(url) = parts.next() else {
            return Command::Invalid("Usage: /connect <url> [user [password]]".to_string());
        };

        Command::Connect(ConnectArgs {
            url: url.to_string(),
            username: parts.next().map(str::to_string),
            password: parts.next().map(str::to_string),
        })
    }

    /// Parse `/sample [n]`.
    fn parse_sample(args: &str) -> Command {
        if args.is_empty() {
            return Command::Sample(DEFAULT_SAMPLE_SIZE);
        }
        match args.parse::<usize>() {
            Ok(size) => Command::Sample(size),
            Err(_) => Command::Invalid("Usage: /sample [rows]".to_string()),
        }
    }

    /// Parse `/flatten on|off`.
    fn parse_flatten(args: &str) -> Command {
        match args.to_lowercase().as_str() {
            "on" | "true" | "yes" => Command::Flatten(true),
            "off" | "false" | "no" => Command::Flatten(false),
            _ => Command::Invalid("Usage: /flatten on|off".to_string()),
        }
    }
}
