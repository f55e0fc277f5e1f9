//! Tool Executor port
//!
//! Defines the interface for executing agent tools (file operations,
//! commands, searches, code intelligence).

use async_trait::async_trait;
use shellpilot_domain::{ToolCall, ToolError};

/// Port for tool execution
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// `- name: description` lines, one per tool, in registration order.
    fn tool_list(&self) -> String;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool;

    /// Execute a tool call.
    ///
    /// An unregistered name yields a [`ToolError`] with code `UNKNOWN_TOOL`.
    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError>;
}
