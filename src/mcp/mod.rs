//! Model Context Protocol (MCP) connection to the SolvaPay tool catalog.

pub mod bridge;
pub mod http;
pub mod schema;
pub mod transport;

pub use bridge::{BridgeOptions, ConnectionState, McpBridge, ToolBridge};
pub use http::StreamableHttpConnector;
pub use schema::RemoteTool;
pub use transport::{CallToolOutcome, JsonObject, McpConnector, McpSession, TransportConfig};
