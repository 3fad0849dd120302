//! Tool-related types: responses and registration options.

use serde::{Deserialize, Serialize};

/// A single content block returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text { text: String },
}

/// Response envelope for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
}

impl ToolResponse {
    /// A response with a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    /// A text response reporting a failed invocation.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::text(format!("Error: {message}"))
    }

    /// Text of the first block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|block| match block {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Options passed alongside a tool registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOptions {
    /// Users must opt in before the host exposes the tool.
    pub optional: bool,
}
