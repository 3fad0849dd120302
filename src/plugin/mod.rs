//! Host plugin runtime interface.
//!
//! The host supplies configuration, a logger, and registries for tools and
//! background services. [`register`] wires the SolvaPay bridge into them.

pub mod register;

pub use register::{
    project_tool, register, register_with, LifecycleState, McpService, SERVICE_ID, TOOL_LABEL,
    TOOL_PREFIX,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{EnvSource, HostConfig, ProcessEnv};
use crate::tools::{HostTool, ToolOptions};

/// Log sink provided by the host. Fire-and-forget.
pub trait PluginLogger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards host log lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PluginLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "solvapay", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "solvapay", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "solvapay", "{message}");
    }
}

/// A background service whose lifecycle the host drives.
#[async_trait]
pub trait PluginService: Send + Sync {
    /// Identifier unique among the host's services.
    fn id(&self) -> &str;

    async fn start(&self);

    async fn stop(&self);
}

/// Capabilities the host runtime exposes to a plugin.
pub trait PluginApi: Send + Sync {
    fn config(&self) -> &HostConfig;

    /// Host log sink. Defaults to [`TracingLogger`].
    fn logger(&self) -> &dyn PluginLogger {
        &TracingLogger
    }

    /// Environment-style fallback lookup.
    fn env(&self, key: &str) -> Option<String> {
        ProcessEnv.var(key)
    }

    fn register_tool(&self, tool: HostTool, options: ToolOptions);

    fn register_service(&self, service: Arc<dyn PluginService>);
}

/// Adapts a host's environment lookup for config resolution.
pub(crate) struct HostEnv<'a>(pub(crate) &'a dyn PluginApi);

impl EnvSource for HostEnv<'_> {
    fn var(&self, key: &str) -> Option<String> {
        self.0.env(key)
    }
}
