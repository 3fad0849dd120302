//! Plugin entry point: config resolution, lifecycle service, and tool
//! projection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{HostEnv, PluginApi, PluginService};
use crate::config::{resolve_config, PLUGIN_ID};
use crate::error::{to_message, Result};
use crate::mcp::bridge::{BridgeOptions, McpBridge, ToolBridge};
use crate::mcp::schema::RemoteTool;
use crate::mcp::transport::JsonObject;
use crate::tools::{HostTool, ToolOptions, ToolResponse};

/// Service id registered with the host.
pub const SERVICE_ID: &str = "solvapay-mcp";
/// Prefix applied to every exposed tool name.
pub const TOOL_PREFIX: &str = "solvapay_";
/// Label used in synthesized tool descriptions.
pub const TOOL_LABEL: &str = "SolvaPay";

const LOG_PREFIX: &str = "[SolvaPay]";

/// Register the SolvaPay integration with the host.
///
/// Returns `None` (after a warning) when no API key is configured; nothing
/// is registered in that case.
pub fn register(api: Arc<dyn PluginApi>) -> Option<Arc<McpService>> {
    register_with(api, |options| -> Arc<dyn ToolBridge> {
        Arc::new(McpBridge::new(options))
    })
}

/// Like [`register`], with a custom bridge factory.
pub fn register_with<F>(api: Arc<dyn PluginApi>, make_bridge: F) -> Option<Arc<McpService>>
where
    F: FnOnce(BridgeOptions) -> Arc<dyn ToolBridge>,
{
    let plugin_config = api.config().plugin_config(PLUGIN_ID);
    let resolved = match resolve_config(plugin_config.as_ref(), &HostEnv(api.as_ref())) {
        Ok(resolved) => resolved,
        Err(e) => {
            api.logger()
                .warn(&format!("{LOG_PREFIX} No API key configured. {}", e.message()));
            return None;
        }
    };

    let endpoint = resolved.endpoint.clone();
    let bridge = make_bridge(BridgeOptions {
        endpoint: resolved.endpoint,
        api_key: resolved.api_key,
    });

    let service = Arc::new(McpService::new(Arc::clone(&api), bridge, endpoint));
    api.register_service(service.clone());
    Some(service)
}

/// Lifecycle flag shared by [`McpService::start`] and [`McpService::stop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Connected,
}

/// Background service owning the bridge's lifecycle inside the host.
pub struct McpService {
    api: Arc<dyn PluginApi>,
    bridge: Arc<dyn ToolBridge>,
    endpoint: String,
    state: Mutex<LifecycleState>,
}

impl McpService {
    pub fn new(api: Arc<dyn PluginApi>, bridge: Arc<dyn ToolBridge>, endpoint: String) -> Self {
        Self {
            api,
            bridge,
            endpoint,
            state: Mutex::new(LifecycleState::Idle),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    async fn connect_and_register(&self, state: &mut LifecycleState) -> Result<()> {
        self.bridge.connect().await?;
        *state = LifecycleState::Connected;
        self.api.logger().info(&format!(
            "{LOG_PREFIX} Connected to MCP server at {}",
            self.endpoint
        ));

        let tools = match self.bridge.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                if let Err(close_err) = self.bridge.close().await {
                    tracing::warn!(error = %close_err, "failed to close bridge after discovery error");
                }
                *state = LifecycleState::Idle;
                return Err(e);
            }
        };

        self.api
            .logger()
            .info(&format!("{LOG_PREFIX} Discovered {} tools", tools.len()));

        for tool in tools {
            let (definition, options) = project_tool(Arc::clone(&self.bridge), tool);
            self.api.register_tool(definition, options);
        }
        Ok(())
    }
}

impl std::fmt::Debug for McpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpService")
            .field("id", &SERVICE_ID)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl PluginService for McpService {
    fn id(&self) -> &str {
        SERVICE_ID
    }

    async fn start(&self) {
        let mut state = self.state.lock().await;
        if *state == LifecycleState::Connected {
            tracing::debug!("MCP service already started");
            return;
        }

        if let Err(e) = self.connect_and_register(&mut state).await {
            self.api
                .logger()
                .error(&format!("{LOG_PREFIX} Failed to connect: {}", to_message(&e)));
        }
    }

    async fn stop(&self) {
        let mut state = self.state.lock().await;
        if *state != LifecycleState::Connected {
            return;
        }

        if let Err(e) = self.bridge.close().await {
            tracing::warn!(error = %e, "MCP bridge close failed");
        }
        *state = LifecycleState::Idle;
        self.api
            .logger()
            .info(&format!("{LOG_PREFIX} Disconnected from MCP server"));
    }
}

/// Turn a discovered remote tool into a host tool definition.
///
/// The handler calls the remote tool by its original name and reports any
/// failure as an `Error: ...` text block instead of failing.
pub fn project_tool(bridge: Arc<dyn ToolBridge>, tool: RemoteTool) -> (HostTool, ToolOptions) {
    let name = format!("{TOOL_PREFIX}{}", tool.name);
    let description = match tool.description {
        Some(description) if !description.is_empty() => description,
        _ => format!("{TOOL_LABEL}: {}", tool.name),
    };
    let remote_name = tool.name;

    let handler = move |_request_id: String, params: JsonObject| {
        let bridge = Arc::clone(&bridge);
        let remote_name = remote_name.clone();
        async move {
            match bridge.call_tool(&remote_name, params).await {
                Ok(text) => ToolResponse::text(text),
                Err(e) => ToolResponse::error(to_message(&e)),
            }
        }
    };

    (
        HostTool::new(name, description, tool.input_schema, handler),
        ToolOptions { optional: true },
    )
}
