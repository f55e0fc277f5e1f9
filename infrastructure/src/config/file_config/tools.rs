//! Tool limits from TOML (`[tools]` section)

use crate::shell::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_MAX_OUTPUT_BYTES};
use crate::tools::ToolSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw tools configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    pub command_timeout_secs: u64,
    pub max_output_bytes: usize,
    pub search_timeout_secs: u64,
    pub search_max_lines: usize,
    pub search_max_bytes: usize,
    /// Directory names skipped by grep, find_files, tree and code_stats
    pub tree_ignore: Vec<String>,
    pub tree_max_depth: usize,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        let settings = ToolSettings::default();
        Self {
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            search_timeout_secs: settings.search_timeout.as_secs(),
            search_max_lines: settings.search_max_lines,
            search_max_bytes: settings.search_max_bytes,
            tree_ignore: settings.tree_ignore,
            tree_max_depth: settings.tree_max_depth,
        }
    }
}

impl FileToolsConfig {
    pub fn to_settings(&self) -> ToolSettings {
        ToolSettings {
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            max_output_bytes: self.max_output_bytes,
            search_timeout: Duration::from_secs(self.search_timeout_secs),
            search_max_lines: self.search_max_lines,
            search_max_bytes: self.search_max_bytes,
            tree_ignore: self.tree_ignore.clone(),
            tree_max_depth: self.tree_max_depth,
        }
    }
}
