//! Shell session persistence from TOML (`[session]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_SESSION_FILE: &str = "~/.shellpilot-session.json";

/// Raw session configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Save the working directory and exported variables between runs
    pub persist: bool,
    pub file: String,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            persist: true,
            file: DEFAULT_SESSION_FILE.to_string(),
        }
    }
}

impl FileSessionConfig {
    /// Session file path with a leading `~` expanded.
    pub fn path(&self) -> PathBuf {
        match (self.file.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_path_expands_home() {
        let config = FileSessionConfig::default();
        let path = config.path();
        assert!(path.ends_with(".shellpilot-session.json"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_session_absolute_path_kept() {
        let config = FileSessionConfig {
            persist: false,
            file: "/var/tmp/s.json".to_string(),
        };
        assert_eq!(config.path(), PathBuf::from("/var/tmp/s.json"));
    }
}
