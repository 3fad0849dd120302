//! Convenience re-exports for common use.

pub use crate::config::{HostConfig, PluginConfig, ResolvedConfig};
pub use crate::error::{to_message, BridgeError, Result};
pub use crate::mcp::{BridgeOptions, JsonObject, McpBridge, RemoteTool, ToolBridge};
pub use crate::plugin::{register, McpService, PluginApi, PluginLogger, PluginService};
pub use crate::tools::{HostTool, ToolContent, ToolOptions, ToolResponse};
