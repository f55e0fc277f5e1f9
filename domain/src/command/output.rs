//! Result of running one shell command.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `30s` for whole seconds, `1500ms` otherwise.
pub fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis().max(1))
    }
}

/// What a shell execution produced.
///
/// `text` is what the model sees. It is already in its final shape
/// (`(command completed successfully)`, `Error (exit code N): …`, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub truncated: bool,
}

impl CommandOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code: Some(0),
            timed_out: false,
            truncated: false,
        }
    }

    pub fn failure(exit_code: Option<i32>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code,
            timed_out: false,
            truncated: false,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            text: format!("Error: command timed out after {}", format_timeout(timeout)),
            exit_code: None,
            timed_out: true,
            truncated: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}
