//! Working directory and environment overlay.
//!
//! Every command the shell executor runs, and every relative path a file
//! tool touches, is resolved against one [`ShellSession`]. The session is
//! shared through a [`SessionHandle`] so that a `cd` in shell mode is seen
//! by the tools in agent mode and the other way round.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Directory and exported variables layered over the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellSession {
    pub working_dir: PathBuf,
    /// Only variables set with `export`; the process environment is inherited.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ShellSession {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
        }
    }

    /// A fresh session rooted at the process's current directory.
    pub fn from_current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Resolve `path` the way a shell in this session would.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.working_dir.join(expanded)
        }
    }

    /// Handle `cd` and `export`, which must change this session rather than
    /// a throwaway child shell. Returns `None` for every other command.
    pub fn apply_builtin(&mut self, command: &str) -> Option<String> {
        let trimmed = command.trim();
        if let Some(target) = builtin_argument(trimmed, "cd") {
            return Some(self.change_dir(target));
        }
        if let Some(assignment) = builtin_argument(trimmed, "export")
            && let Some((name, value)) = assignment.split_once('=')
            && is_variable_name(name)
        {
            let value = strip_quotes(value.trim());
            debug!("Session export {}={}", name, value);
            self.env.insert(name.to_string(), value.to_string());
            return Some(format!("Exported: {}={}", name, value));
        }
        None
    }

    fn change_dir(&mut self, target: &str) -> String {
        let target = self.resolve(strip_quotes(target.trim()));
        if target.is_dir() {
            // Collapse `..` and symlinks so the prompt shows a clean path.
            self.working_dir = target.canonicalize().unwrap_or(target);
            debug!("Session cd {}", self.working_dir.display());
            format!("Changed directory to: {}", self.working_dir.display())
        } else {
            format!("Error: Directory not found: {}", target.display())
        }
    }
}

/// `cd foo` → `Some("foo")`. The keyword must be followed by whitespace.
fn builtin_argument<'a>(command: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = command.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty() && !rest.contains('\n')).then_some(rest)
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~')
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest.trim_start_matches('/'));
    }
    PathBuf::from(path)
}

/// Shared, cloneable access to one [`ShellSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<RwLock<ShellSession>>);

impl SessionHandle {
    pub fn new(session: ShellSession) -> Self {
        Self(Arc::new(RwLock::new(session)))
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ShellSession {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn working_dir(&self) -> PathBuf {
        self.0
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .working_dir
            .clone()
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.0.read().unwrap_or_else(|e| e.into_inner()).resolve(path)
    }

    pub fn apply_builtin(&self, command: &str) -> Option<String> {
        self.0
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .apply_builtin(command)
    }

    /// Replace the whole session, e.g. after a restore or a reset.
    pub fn replace(&self, session: ShellSession) {
        *self.0.write().unwrap_or_else(|e| e.into_inner()) = session;
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new(ShellSession::from_current_dir())
    }
}
