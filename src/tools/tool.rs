//! Closure-based host tool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::types::ToolResponse;
use crate::mcp::transport::JsonObject;

/// Type alias for the tool handler function.
///
/// Handlers receive the host's request id and the argument mapping, and
/// always produce a response envelope.
type ToolHandler = dyn Fn(String, JsonObject) -> Pin<Box<dyn Future<Output = ToolResponse> + Send>>
    + Send
    + Sync;

/// A tool definition handed to the host registry.
#[derive(Clone)]
pub struct HostTool {
    name: String,
    description: String,
    parameters: serde_json::Value,
    handler: Arc<ToolHandler>,
}

impl HostTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(String, JsonObject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResponse> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |id, params| Box::pin(handler(id, params))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema for the tool's arguments.
    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    /// Run the tool for one host request.
    pub async fn execute(&self, request_id: &str, params: JsonObject) -> ToolResponse {
        (self.handler)(request_id.to_string(), params).await
    }
}

impl std::fmt::Debug for HostTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
