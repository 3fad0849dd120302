//! Error types for the SolvaPay MCP bridge.

use thiserror::Error;

/// Primary error type for all bridge and registrar operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid MCP endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("MCP handshake failed: {message}")]
    Handshake {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Not connected")]
    NotConnected,

    #[error("MCP {operation} failed: {message}")]
    RemoteCall {
        operation: &'static str,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// Create a handshake error without an underlying source.
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
            source: None,
        }
    }

    /// Create a handshake error that keeps the underlying cause.
    pub fn handshake_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Handshake {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a remote call error for the named operation.
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            operation,
            message: message.into(),
        }
    }

    /// The underlying message, without the variant's display prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Handshake { message, .. } | Self::RemoteCall { message, .. } => message.clone(),
            Self::Other(message) | Self::ConfigurationMissing(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error was raised locally because the bridge had no session.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}

/// Normalize any caught error into the message shown to hosts and users.
///
/// Bridge errors contribute their bare message; anything else falls back to
/// its display form.
pub fn to_message(error: &(dyn std::error::Error + 'static)) -> String {
    match error.downcast_ref::<BridgeError>() {
        Some(bridge_error) => bridge_error.message(),
        None => error.to_string(),
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BridgeError>;
