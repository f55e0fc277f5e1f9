//! Agent loop configuration from TOML (`[agent]` section)

use serde::{Deserialize, Serialize};
use shellpilot_application::LoopParams;

/// Raw agent configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Tool batches executed per user turn before the loop stops
    pub max_iterations: usize,
    /// Run extracted shell commands without asking
    pub auto_execute: bool,
    /// Identical single-tool batches in a row before a warning
    pub repeat_threshold: usize,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        let params = LoopParams::default();
        Self {
            max_iterations: params.max_iterations,
            auto_execute: params.auto_execute,
            repeat_threshold: params.repeat_threshold,
        }
    }
}

impl FileAgentConfig {
    pub fn to_loop_params(&self) -> LoopParams {
        LoopParams {
            max_iterations: self.max_iterations,
            repeat_threshold: self.repeat_threshold,
            auto_execute: self.auto_execute,
        }
    }
}
