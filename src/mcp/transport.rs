//! MCP transport layer.
//!
//! The remote protocol is consumed through two seams: an [`McpConnector`]
//! that performs the handshake, and the [`McpSession`] it yields.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use super::schema::RemoteTool;
use crate::error::{BridgeError, Result};

/// Header carrying the SolvaPay API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";
/// Client name announced during the handshake.
pub const CLIENT_NAME: &str = "solvapay-openclaw";
/// Client version announced during the handshake.
pub const CLIENT_VERSION: &str = "1.0.0";

/// Tool-call argument mapping.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Where and how to reach the MCP server.
#[derive(Clone)]
pub struct TransportConfig {
    endpoint: Url,
    api_key: String,
}

impl TransportConfig {
    /// Validate the endpoint and bind the credential to it.
    ///
    /// The endpoint must be an absolute URL.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| BridgeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"..")
            .finish()
    }
}

/// Raw result of a remote tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallToolOutcome {
    /// Content blocks exactly as the server sent them, each tagged by `type`.
    pub content: Vec<serde_json::Value>,
    /// The server flagged the result as a tool-level error.
    pub is_error: bool,
}

/// An established MCP session.
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Fetch the server's tool catalog.
    async fn list_tools(&self) -> Result<Vec<RemoteTool>>;

    /// Invoke a tool by its remote name.
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<CallToolOutcome>;

    /// Shut the session down. Calling it again must be a no-op.
    async fn close(&self) -> Result<()>;
}

/// Performs the handshake and yields a live session.
#[async_trait]
pub trait McpConnector: Send + Sync {
    async fn connect(&self, config: &TransportConfig) -> Result<Arc<dyn McpSession>>;
}
