//! Environment header prepended to user turns.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SHELL_INSTRUCTION: &str =
    "Format shell commands in bash code blocks. Keep responses concise and technical.";

/// Where the human is working, as reported to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemContext {
    pub os: String,
    pub user: String,
    pub working_dir: PathBuf,
}

impl SystemContext {
    pub fn new(os: impl Into<String>, user: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            os: os.into(),
            user: user.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn prefix(&self) -> String {
        format!(
            "[SYSTEM: OS={}, User={}, Dir={}]\n[INSTRUCTION: {}]\n\n",
            self.os,
            self.user,
            self.working_dir.display(),
            SHELL_INSTRUCTION
        )
    }

    pub fn wrap(&self, message: &str) -> String {
        format!("{}{}", self.prefix(), message)
    }
}
