//! Tool domain value objects: the failure side of a tool invocation.
//!
//! A tool handler either returns its result text or a [`ToolError`]. The
//! iteration controller never aborts on a `ToolError`; it turns it into a
//! feedback line for the model (see [`ToolError::feedback_line`]).
//!
//! | Code | Raised when |
//! |------|-------------|
//! | `UNKNOWN_TOOL` | No handler is registered under the requested name |
//! | `INVALID_ARGUMENT` | Missing or malformed parameters |
//! | `NOT_FOUND` | File, directory or match target does not exist |
//! | `AMBIGUOUS_MATCH` | A unique-match edit found more than one target |
//! | `EXECUTION_FAILED` | I/O error, non-zero exit, helper process failure |
//! | `PERMISSION_DENIED` | Access denied by the OS |
//! | `TIMEOUT` | Wall-clock bound exceeded; the process was killed |
//! | `REFUSED` | The human declined a dangerous command; nothing ran |

use serde::{Deserialize, Serialize};

pub const UNKNOWN_TOOL: &str = "UNKNOWN_TOOL";
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const AMBIGUOUS_MATCH: &str = "AMBIGUOUS_MATCH";
pub const EXECUTION_FAILED: &str = "EXECUTION_FAILED";
pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
pub const TIMEOUT: &str = "TIMEOUT";
pub const REFUSED: &str = "REFUSED";

/// Error that occurred during tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "AMBIGUOUS_MATCH")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::new(UNKNOWN_TOOL, format!("Tool not found: {}", name.into()))
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, format!("Resource not found: {}", resource.into()))
    }

    pub fn permission_denied(resource: impl Into<String>) -> Self {
        Self::new(
            PERMISSION_DENIED,
            format!("Permission denied: {}", resource.into()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(INVALID_ARGUMENT, message)
    }

    pub fn ambiguous_match(message: impl Into<String>) -> Self {
        Self::new(AMBIGUOUS_MATCH, message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(EXECUTION_FAILED, message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(TIMEOUT, format!("Operation timed out: {}", operation.into()))
    }

    pub fn refused(command: impl Into<String>) -> Self {
        Self::new(
            REFUSED,
            format!("Refused by user, not executed: {}", command.into()),
        )
    }

    /// Map an I/O error on `path` to the closest tool error.
    pub fn from_io(err: &std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::execution_failed(format!("{}: {}", path, err)),
        }
    }

    pub fn is_unknown_tool(&self) -> bool {
        self.code == UNKNOWN_TOOL
    }

    /// The `[tool] Error: <message>` line fed back to the model.
    pub fn feedback_line(&self, tool_name: &str) -> String {
        match &self.details {
            Some(details) => format!("[{}] Error: {} ({})", tool_name, self.message, details),
            None => format!("[{}] Error: {}", tool_name, self.message),
        }
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}
