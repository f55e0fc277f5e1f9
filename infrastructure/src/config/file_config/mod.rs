//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes.

mod agent;
mod logging;
mod lsp;
mod model;
mod safety;
mod session;
mod tools;

pub use agent::FileAgentConfig;
pub use logging::FileLoggingConfig;
pub use lsp::FileLspConfig;
pub use model::FileModelConfig;
pub use safety::FileSafetyConfig;
pub use session::FileSessionConfig;
pub use tools::FileToolsConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("agent.max_iterations cannot be 0")]
    ZeroMaxIterations,

    #[error("tools.command_timeout_secs cannot be 0")]
    ZeroCommandTimeout,

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("model.base_url cannot be empty")]
    EmptyBaseUrl,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat endpoint and model
    pub model: FileModelConfig,
    /// Iteration limits
    pub agent: FileAgentConfig,
    /// Dangerous and interactive command lists
    pub safety: FileSafetyConfig,
    /// Tool timeouts and output caps
    pub tools: FileToolsConfig,
    /// Language servers for `code_intel`
    pub lsp: FileLspConfig,
    /// Working-directory persistence
    pub session: FileSessionConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Check values that would make the program unusable. Stops at the
    /// first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigValidationError::ZeroMaxIterations);
        }
        if self.tools.command_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroCommandTimeout);
        }
        if self.model.name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.model.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[model]
base_url = "http://localhost:11434/v1"
name = "qwen2.5-coder"
api_key_env = "LOCAL_KEY"

[agent]
max_iterations = 5
repeat_threshold = 3

[safety]
interactive_programs = ["vim"]

[tools]
search_max_lines = 200

[lsp.servers]
python = "pyright-langserver --stdio"

[session]
persist = false

[logging]
dir = "/tmp/shellpilot-logs"
conversation_log = true
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.name, "qwen2.5-coder");
        assert_eq!(config.model.request_timeout_secs, 120);
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.safety.interactive_programs, vec!["vim".to_string()]);
        assert_eq!(config.tools.search_max_lines, 200);
        assert_eq!(
            config.lsp.servers.get("python").map(String::as_str),
            Some("pyright-langserver --stdio")
        );
        assert!(!config.session.persist);
        assert!(config.logging.conversation_log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.model.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.agent.max_iterations, 10);
        assert!(config.session.persist);
        assert!(config.logging.dir.is_none());
        assert!(!config.logging.conversation_log);
        assert_eq!(config.lsp.servers.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        let mut config = FileConfig::default();
        config.agent.max_iterations = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroMaxIterations));

        let mut config = FileConfig::default();
        config.tools.command_timeout_secs = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroCommandTimeout));

        let mut config = FileConfig::default();
        config.model.name = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyModelName));

        let mut config = FileConfig::default();
        config.model.base_url.clear();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyBaseUrl));
    }
}
