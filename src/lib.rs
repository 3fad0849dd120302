//! SolvaPay MCP bridge for the OpenClaw plugin host.
//!
//! Connects to the hosted SolvaPay MCP server, discovers its tools, and
//! registers each one as an optional host tool named `solvapay_<tool>`, so
//! an agent can manage payments, customers, and plans through chat.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use solvapay_mcp::plugin::{register, PluginApi};
//!
//! # fn example(api: Arc<dyn PluginApi>) {
//! // Registers the `solvapay-mcp` service; tools appear once the host starts it.
//! let _service = register(api);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod plugin;
pub mod prelude;
pub mod tools;

#[cfg(feature = "cli")]
pub mod cli;
