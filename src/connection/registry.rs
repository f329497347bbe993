//! Connection registry: the currently active search-store target.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::error::{Result, SearchError};
use crate::search::SearchClient;

/// An immutable connection snapshot: endpoint plus optional credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
}

impl Connection {
    /// Creates a connection to the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    /// Sets basic-auth credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Builds a connection from resolved configuration.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        let endpoint = config
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| SearchError::validation("No search endpoint configured"))?;

        // Normalizes the URL and lifts any embedded credentials
        let mut parsed = ConnectionConfig::from_url(endpoint)?;
        parsed.merge(&ConnectionConfig {
            url: None,
            username: config.username.clone(),
            password: config.password.clone(),
        });

        let mut connection = Self::new(parsed.url.unwrap_or_default());
        if let Some(user) = parsed.username {
            connection = connection.with_credentials(user, parsed.password);
        }
        Ok(connection)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Identity used to scope cached schemas: endpoint and user.
    pub fn identity(&self) -> String {
        match &self.username {
            Some(user) => format!("{user}@{}", self.endpoint),
            None => self.endpoint.clone(),
        }
    }

    /// Returns a display-safe string (no password).
    pub fn display_string(&self) -> String {
        match &self.username {
            Some(user) => format!("{user} @ {}", self.endpoint),
            None => self.endpoint.clone(),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// The active connection together with the client bound to it.
#[derive(Clone)]
pub struct ActiveConnection {
    /// Connection snapshot.
    pub connection: Arc<Connection>,
    /// Client bound to this connection.
    pub client: Arc<dyn SearchClient>,
    /// Cancelled when this connection is replaced.
    pub cancel: CancellationToken,
}

/// Holds the current search-store target.
///
/// Every replacement bumps the generation and cancels the previous
/// connection's token, so in-flight work bound to it can be abandoned.
pub struct ConnectionRegistry {
    active: Option<ActiveConnection>,
    generation: u64,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            active: None,
            generation: 0,
        }
    }

    /// Returns a snapshot of the active connection, if any.
    pub fn current(&self) -> Option<ActiveConnection> {
        self.active.clone()
    }

    /// Returns the active connection or a validation error.
    pub fn require(&self) -> Result<ActiveConnection> {
        self.current()
            .ok_or_else(|| SearchError::validation("Not connected to a search store"))
    }

    /// Replaces the active connection, returning the new generation.
    pub fn replace(&mut self, connection: Connection, client: Arc<dyn SearchClient>) -> u64 {
        self.cancel_active();
        self.generation += 1;

        info!(
            generation = self.generation,
            endpoint = connection.endpoint(),
            "Connection replaced"
        );

        self.active = Some(ActiveConnection {
            connection: Arc::new(connection),
            client,
            cancel: CancellationToken::new(),
        });
        self.generation
    }

    /// Drops the active connection.
    pub fn disconnect(&mut self) {
        self.cancel_active();
        self.generation += 1;
        self.active = None;
    }

    /// Returns true if a connection is active.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    fn cancel_active(&mut self) {
        if let Some(old) = self.active.take() {
            old.cancel.cancel();
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
