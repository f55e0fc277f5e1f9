//! What every built-in tool needs: the shared session overlay and limits.

use crate::shell::{CaptureLimits, SessionHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TREE_IGNORE: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "__pycache__",
    "dist",
    "build",
    ".venv",
];

/// Limits for the built-in tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub command_timeout: Duration,
    pub max_output_bytes: usize,
    pub search_timeout: Duration,
    pub search_max_lines: usize,
    pub search_max_bytes: usize,
    /// Directory names skipped by `tree`, `grep`, `find_files` and `code_stats`.
    pub tree_ignore: Vec<String>,
    pub tree_max_depth: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            max_output_bytes: 10 * 1024 * 1024,
            search_timeout: Duration::from_secs(5),
            search_max_lines: 50,
            search_max_bytes: 1024 * 1024,
            tree_ignore: DEFAULT_TREE_IGNORE.iter().map(|s| s.to_string()).collect(),
            tree_max_depth: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolContext {
    pub session: SessionHandle,
    pub settings: Arc<ToolSettings>,
}

impl ToolContext {
    pub fn new(session: SessionHandle, settings: ToolSettings) -> Self {
        Self {
            session,
            settings: Arc::new(settings),
        }
    }

    /// Resolve a tool path against the session's working directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.session.resolve(path)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.settings.tree_ignore.iter().any(|i| i == name)
    }

    /// Capture limits for a run, with an optional per-call timeout.
    pub fn capture_limits(&self, timeout: Option<Duration>) -> CaptureLimits {
        CaptureLimits {
            timeout: timeout.unwrap_or(self.settings.command_timeout),
            max_output_bytes: self.settings.max_output_bytes,
        }
    }
}
