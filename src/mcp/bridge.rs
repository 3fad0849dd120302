//! Bridge between the SolvaPay MCP server and local tool invocations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::http::StreamableHttpConnector;
use super::schema::RemoteTool;
use super::transport::{JsonObject, McpConnector, McpSession, TransportConfig};
use crate::error::{BridgeError, Result};

/// Operations the registrar needs from a bridge.
#[async_trait]
pub trait ToolBridge: Send + Sync {
    /// Connect (or reconnect) and perform the handshake.
    async fn connect(&self) -> Result<()>;

    /// Discover the remote tool catalog, in server order.
    async fn list_tools(&self) -> Result<Vec<RemoteTool>>;

    /// Invoke a remote tool and flatten its result to a string.
    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<String>;

    /// Drop the connection. Safe to call in any state.
    async fn close(&self) -> Result<()>;
}

/// Endpoint and credential for one bridge.
#[derive(Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    pub endpoint: String,
    pub api_key: String,
}

impl fmt::Debug for BridgeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeOptions")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"..")
            .finish()
    }
}

/// Connection state of an [`McpBridge`].
#[derive(Clone, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(Arc<dyn McpSession>),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    fn session(&self) -> Result<Arc<dyn McpSession>> {
        match self {
            Self::Connected(session) => Ok(Arc::clone(session)),
            Self::Disconnected => Err(BridgeError::NotConnected),
        }
    }
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Connected(_) => f.write_str("Connected"),
        }
    }
}

/// Owns exactly one MCP connection.
///
/// Connected-only operations take a snapshot of the session under a read
/// lock and release it before the round trip, so a concurrent [`close`]
/// never invalidates an in-flight call and parallel calls do not serialize.
///
/// [`close`]: McpBridge::close
pub struct McpBridge {
    options: BridgeOptions,
    connector: Arc<dyn McpConnector>,
    state: RwLock<ConnectionState>,
}

impl McpBridge {
    /// Create a bridge that connects over streamable HTTP.
    pub fn new(options: BridgeOptions) -> Self {
        Self::with_connector(options, Arc::new(StreamableHttpConnector::new()))
    }

    /// Create a bridge over a custom connector.
    pub fn with_connector(options: BridgeOptions, connector: Arc<dyn McpConnector>) -> Self {
        Self {
            options,
            connector,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_connected()
    }

    /// Connect to the server and perform the handshake.
    ///
    /// An existing connection is closed first. On failure the bridge is left
    /// disconnected.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;

        if let ConnectionState::Connected(previous) = std::mem::take(&mut *state) {
            if let Err(e) = previous.close().await {
                tracing::warn!(error = %e, "failed to close superseded MCP session");
            }
        }

        let config = TransportConfig::new(&self.options.endpoint, self.options.api_key.clone())?;
        let session = self.connector.connect(&config).await.map_err(into_handshake)?;

        tracing::debug!(endpoint = %self.options.endpoint, "MCP bridge connected");
        *state = ConnectionState::Connected(session);
        Ok(())
    }

    /// Discover all tools available on the server.
    pub async fn list_tools(&self) -> Result<Vec<RemoteTool>> {
        let session = self.state.read().await.session()?;
        let tools = session.list_tools().await?;
        tracing::debug!(count = tools.len(), "MCP tools discovered");
        Ok(tools)
    }

    /// Forward a tool call and return its text result.
    pub async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<String> {
        let session = self.state.read().await.session()?;
        let outcome = session.call_tool(name, arguments).await?;
        if outcome.is_error {
            tracing::debug!(tool = name, "MCP tool reported an error result");
        }
        flatten_content(&outcome.content)
    }

    /// Close the connection. A no-op when already disconnected.
    pub async fn close(&self) -> Result<()> {
        let previous = std::mem::take(&mut *self.state.write().await);
        match previous {
            ConnectionState::Connected(session) => {
                tracing::debug!(endpoint = %self.options.endpoint, "closing MCP bridge");
                session.close().await
            }
            ConnectionState::Disconnected => Ok(()),
        }
    }
}

impl fmt::Debug for McpBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpBridge")
            .field("options", &self.options)
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl ToolBridge for McpBridge {
    async fn connect(&self) -> Result<()> {
        McpBridge::connect(self).await
    }

    async fn list_tools(&self) -> Result<Vec<RemoteTool>> {
        McpBridge::list_tools(self).await
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<String> {
        McpBridge::call_tool(self, name, arguments).await
    }

    async fn close(&self) -> Result<()> {
        McpBridge::close(self).await
    }
}

fn into_handshake(error: BridgeError) -> BridgeError {
    match error {
        BridgeError::Handshake { .. } => error,
        other => BridgeError::Handshake {
            message: other.message(),
            source: Some(Box::new(other)),
        },
    }
}

/// Join the non-empty text blocks with newlines, or fall back to the JSON
/// form of the whole content array when there are none.
pub fn flatten_content(content: &[serde_json::Value]) -> Result<String> {
    let parts: Vec<&str> = content
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        Ok(serde_json::to_string(content)?)
    } else {
        Ok(parts.join("\n"))
    }
}
