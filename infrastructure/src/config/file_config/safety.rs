//! Command safety lists from TOML (`[safety]` section)

use serde::{Deserialize, Serialize};
use shellpilot_domain::CommandPolicy;

/// Raw safety configuration from TOML
///
/// Either list replaces the built-in one entirely when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSafetyConfig {
    /// Substrings that mark a command as dangerous
    pub dangerous_patterns: Vec<String>,
    /// Programs that need the terminal
    pub interactive_programs: Vec<String>,
}

impl Default for FileSafetyConfig {
    fn default() -> Self {
        let policy = CommandPolicy::default();
        Self {
            dangerous_patterns: policy.dangerous_patterns,
            interactive_programs: policy.interactive_programs,
        }
    }
}

impl FileSafetyConfig {
    pub fn to_policy(&self) -> CommandPolicy {
        CommandPolicy::new(
            self.dangerous_patterns.clone(),
            self.interactive_programs.clone(),
        )
    }
}
