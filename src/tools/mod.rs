//! Host-facing tool definitions.

pub mod tool;
pub mod types;

pub use tool::HostTool;
pub use types::{ToolContent, ToolOptions, ToolResponse};
