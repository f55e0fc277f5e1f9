//! JSON persistence of the session overlay between runs.

use super::session::ShellSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed session file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    #[serde(flatten)]
    session: ShellSession,
    timestamp: DateTime<Utc>,
}

/// Reads and writes one session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, session: &ShellSession) -> Result<(), SessionStoreError> {
        let stored = StoredSession {
            session: session.clone(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|source| {
            SessionStoreError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        std::fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    /// The stored session, or `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<ShellSession>, SessionStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let stored: StoredSession =
            serde_json::from_str(&content).map_err(|source| SessionStoreError::Format {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(stored.session))
    }

    /// Startup restore. A stored directory that no longer exists falls back
    /// to `fallback`'s directory but keeps the exported variables.
    pub fn restore_or(&self, fallback: ShellSession) -> ShellSession {
        match self.load() {
            Ok(Some(mut stored)) => {
                if !stored.working_dir.is_dir() {
                    debug!(
                        "Stored directory {} is gone, using {}",
                        stored.working_dir.display(),
                        fallback.working_dir.display()
                    );
                    stored.working_dir = fallback.working_dir;
                }
                stored
            }
            Ok(None) => fallback,
            Err(e) => {
                warn!("Ignoring session file: {}", e);
                fallback
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_restore() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let mut session = ShellSession::new(dir.path());
        session.env.insert("A".into(), "1".into());

        store.save(&session).unwrap();
        let restored = store.restore_or(ShellSession::new("/"));

        assert_eq!(restored, session);
    }

    #[test]
    fn missing_file_uses_fallback() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("none.json"));

        assert!(store.load().unwrap().is_none());
        assert_eq!(store.restore_or(ShellSession::new("/")).working_dir, PathBuf::from("/"));
    }

    #[test]
    fn vanished_directory_falls_back_but_keeps_env() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let mut session = ShellSession::new(dir.path().join("gone"));
        session.env.insert("KEEP".into(), "yes".into());
        store.save(&session).unwrap();

        let restored = store.restore_or(ShellSession::new(dir.path()));

        assert_eq!(restored.working_dir, dir.path());
        assert_eq!(restored.env.get("KEEP").map(String::as_str), Some("yes"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(&path);

        assert!(matches!(store.load(), Err(SessionStoreError::Format { .. })));
        assert_eq!(store.restore_or(ShellSession::new("/")).working_dir, PathBuf::from("/"));
    }
}
