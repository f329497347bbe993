//! Error types for es-glance.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for es-glance operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Missing or malformed local input (question, collection, draft, connection).
    /// No network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure talking to a collaborator service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The timeout guard abandoned the operation.
    #[error("{operation} timed out after {secs} seconds")]
    Timeout { operation: String, secs: u64 },

    /// Non-success status from a collaborator service.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// Success status with a body that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The drafting service failed or produced no query text.
    #[error("Generation error: {0}")]
    Generation(String),

    /// A request of the same kind is already in flight.
    #[error("{0} already in progress")]
    Busy(String),

    /// A response arrived after a reconnect and was discarded.
    #[error("Discarded result from a previous connection: {0}")]
    Stale(String),

    /// Configuration errors (invalid config file, bad connection URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Creates a remote error from a status code and extracted message.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a busy error for the named operation.
    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy(operation.into())
    }

    /// Creates a stale-result error with the given message.
    pub fn stale(msg: impl Into<String>) -> Self {
        Self::Stale(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the timeout guard produced this error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::Transport(_) => "Transport Error",
            Self::Timeout { .. } => "Timed Out",
            Self::Remote { .. } => "Remote Error",
            Self::Decode(_) => "Remote Error",
            Self::Generation(_) => "Generation Error",
            Self::Busy(_) => "Busy",
            Self::Stale(_) => "Stale Result",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
