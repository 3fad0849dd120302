//! Streamable HTTP MCP connection backed by `rmcp`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use rmcp::model::{
    CallToolRequest, CallToolRequestParams, CallToolResult, ClientInfo, ClientRequest,
    ProtocolVersion, ServerResult,
};
use rmcp::service::{ClientInitializeError, Peer, RoleClient, RunningService, ServiceError};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ServiceExt;
use tokio::sync::Mutex;

use super::schema::RemoteTool;
use super::transport::{
    CallToolOutcome, JsonObject, McpConnector, McpSession, TransportConfig, API_KEY_HEADER,
    CLIENT_NAME, CLIENT_VERSION,
};
use crate::error::{BridgeError, Result};

type ClientService = RunningService<RoleClient, ClientInfo>;

/// Connects to an MCP server over streamable HTTP, authenticating with
/// the `X-API-Key` header.
#[derive(Debug, Clone, Default)]
pub struct StreamableHttpConnector;

impl StreamableHttpConnector {
    pub fn new() -> Self {
        Self
    }

    fn transport_config(config: &TransportConfig) -> Result<StreamableHttpClientTransportConfig> {
        let mut value = HeaderValue::from_str(config.api_key()).map_err(|e| {
            BridgeError::handshake_with_source("API key is not a valid header value", e)
        })?;
        value.set_sensitive(true);

        let headers = HashMap::from([(HeaderName::from_static("x-api-key"), value)]);
        Ok(
            StreamableHttpClientTransportConfig::with_uri(config.endpoint().as_str())
                .custom_headers(headers),
        )
    }

    fn client_info() -> ClientInfo {
        let mut info = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };
        info.client_info.name = CLIENT_NAME.to_string();
        info.client_info.version = CLIENT_VERSION.to_string();
        info
    }
}

#[async_trait]
impl McpConnector for StreamableHttpConnector {
    async fn connect(&self, config: &TransportConfig) -> Result<Arc<dyn McpSession>> {
        let transport = StreamableHttpClientTransport::from_config(Self::transport_config(config)?);

        tracing::debug!(
            endpoint = %config.endpoint(),
            header = API_KEY_HEADER,
            "starting MCP handshake"
        );
        let service = Self::client_info()
            .serve(transport)
            .await
            .map_err(map_client_initialize_error)?;

        Ok(Arc::new(StreamableHttpSession::new(service)))
    }
}

/// A running rmcp client session.
///
/// Requests go through a cloned [`Peer`], so they never contend with
/// `close` for the service handle.
pub struct StreamableHttpSession {
    peer: Peer<RoleClient>,
    service: Mutex<Option<ClientService>>,
}

impl StreamableHttpSession {
    fn new(service: ClientService) -> Self {
        Self {
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
        }
    }
}

#[async_trait]
impl McpSession for StreamableHttpSession {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>> {
        let tools = match self.peer.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => {
                self.peer
                    .list_tools(None)
                    .await
                    .map_err(|e| map_service_error("list_tools", e))?
                    .tools
            }
            Err(e) => return Err(map_service_error("list_tools", e)),
        };

        Ok(tools.into_iter().map(map_remote_tool).collect())
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<CallToolOutcome> {
        let request = CallToolRequest::new(CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        });
        let response = self
            .peer
            .send_request(ClientRequest::CallToolRequest(request))
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        match response {
            ServerResult::CallToolResult(result) => map_call_result(result),
            // A result with empty content and no structured content does not
            // decode as CallToolResult, so read the blocks back from whatever
            // variant it landed in.
            other => map_untyped_result(&serde_json::to_value(&other)?),
        }
    }

    async fn close(&self) -> Result<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        match service.cancel().await {
            Ok(reason) => {
                tracing::debug!(?reason, "MCP session closed");
                Ok(())
            }
            Err(e) => Err(BridgeError::remote("close", e.to_string())),
        }
    }
}

fn map_remote_tool(tool: rmcp::model::Tool) -> RemoteTool {
    RemoteTool {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn map_call_result(result: CallToolResult) -> Result<CallToolOutcome> {
    let content = result
        .content
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(CallToolOutcome {
        content,
        is_error: result.is_error.unwrap_or(false),
    })
}

fn map_untyped_result(value: &serde_json::Value) -> Result<CallToolOutcome> {
    let content = value
        .get("content")
        .and_then(|content| content.as_array())
        .cloned()
        .unwrap_or_default();
    let is_error = value
        .get("isError")
        .and_then(|flag| flag.as_bool())
        .unwrap_or(false);

    Ok(CallToolOutcome { content, is_error })
}

fn map_client_initialize_error(error: ClientInitializeError) -> BridgeError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            BridgeError::handshake(format!("connection closed during initialize: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            BridgeError::handshake(format!("transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => BridgeError::handshake(format!(
            "JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        ClientInitializeError::Cancelled => BridgeError::handshake("initialize cancelled"),
        other => BridgeError::handshake(other.to_string()),
    }
}

fn map_service_error(operation: &'static str, error: ServiceError) -> BridgeError {
    match error {
        ServiceError::McpError(error) => BridgeError::remote(operation, error.message.to_string()),
        ServiceError::TransportSend(error) => {
            BridgeError::remote(operation, format!("transport send failed: {error}"))
        }
        ServiceError::TransportClosed => BridgeError::remote(operation, "transport closed"),
        ServiceError::UnexpectedResponse => {
            BridgeError::remote(operation, "unexpected MCP response")
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            BridgeError::remote(operation, format!("request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => BridgeError::remote(
            operation,
            format!("request timed out after {}ms", timeout.as_millis()),
        ),
        other => BridgeError::remote(operation, other.to_string()),
    }
}
