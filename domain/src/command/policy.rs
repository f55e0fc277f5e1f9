//! Command safety classification.
//!
//! [`CommandPolicy`] holds the two lists the classifier consults. They are
//! plain data so configuration and tests can swap them without touching a
//! shell.

use serde::{Deserialize, Serialize};

/// Destructive substrings. Matching is plain containment, so a benign
/// command that merely mentions one is flagged too.
pub const DEFAULT_DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf",
    "dd if=",
    "mkfs",
    ":(){:|:&};:",
    "chmod -R 777",
    "> /dev/sda",
];

/// Programs that take over the terminal.
pub const DEFAULT_INTERACTIVE_PROGRAMS: &[&str] = &[
    "vim", "vi", "nano", "emacs", "ssh", "python", "python3", "node", "irb", "mysql", "psql",
    "top", "htop", "less", "more",
];

const PRIVILEGE_PREFIX: &str = "sudo";

/// How a command must be handled before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Needs explicit human confirmation.
    Dangerous,
    /// Needs the terminal-attached execution path.
    Interactive,
    /// Captured-output execution.
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPolicy {
    pub dangerous_patterns: Vec<String>,
    pub interactive_programs: Vec<String>,
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self {
            dangerous_patterns: DEFAULT_DANGEROUS_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            interactive_programs: DEFAULT_INTERACTIVE_PROGRAMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CommandPolicy {
    pub fn new(dangerous_patterns: Vec<String>, interactive_programs: Vec<String>) -> Self {
        Self {
            dangerous_patterns,
            interactive_programs,
        }
    }

    pub fn is_dangerous(&self, command: &str) -> bool {
        self.dangerous_patterns
            .iter()
            .any(|pattern| command.contains(pattern.as_str()))
    }

    pub fn is_interactive(&self, command: &str) -> bool {
        let program = program_name(command);
        !program.is_empty() && self.interactive_programs.iter().any(|p| p == program)
    }

    /// Dangerous takes precedence over interactive.
    pub fn classify(&self, command: &str) -> CommandClass {
        if self.is_dangerous(command) {
            CommandClass::Dangerous
        } else if self.is_interactive(command) {
            CommandClass::Interactive
        } else {
            CommandClass::Normal
        }
    }
}

/// First whitespace-delimited token after an optional leading `sudo`.
fn program_name(command: &str) -> &str {
    let trimmed = command.trim();
    let without_sudo = trimmed
        .strip_prefix(PRIVILEGE_PREFIX)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim_start)
        .unwrap_or(trimmed);
    without_sudo.split_whitespace().next().unwrap_or("")
}
