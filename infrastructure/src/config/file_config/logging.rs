//! Log destinations from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for the rolling tracing log and conversation logs
    pub dir: Option<PathBuf>,
    /// Write a JSONL conversation log into `dir`
    pub conversation_log: bool,
}
