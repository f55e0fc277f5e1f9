//! Lazily started language servers, one per language.

use super::LspError;
use super::client::LspClient;
use super::protocol::language_id;
use crate::shell::SessionHandle;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Default language → server command lines.
pub fn default_servers() -> BTreeMap<String, String> {
    [
        ("rust", "rust-analyzer"),
        ("typescript", "typescript-language-server --stdio"),
        ("javascript", "typescript-language-server --stdio"),
        ("python", "pylsp"),
        ("go", "gopls"),
        ("c", "clangd"),
        ("cpp", "clangd"),
    ]
    .into_iter()
    .map(|(lang, cmd)| (lang.to_string(), cmd.to_string()))
    .collect()
}

pub struct LspPool {
    servers: BTreeMap<String, String>,
    session: SessionHandle,
    clients: Mutex<HashMap<String, Arc<LspClient>>>,
}

impl LspPool {
    pub fn new(servers: BTreeMap<String, String>, session: SessionHandle) -> Self {
        Self {
            servers,
            session,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Client for the language of `path`, started on first use.
    pub async fn client_for(&self, path: &Path) -> Result<Arc<LspClient>, LspError> {
        self.client_for_language(language_id(path)).await
    }

    pub async fn client_for_language(&self, language: &str) -> Result<Arc<LspClient>, LspError> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(language) {
            return Ok(Arc::clone(client));
        }
        let command = self
            .servers
            .get(language)
            .ok_or_else(|| LspError::NoServer(language.to_string()))?;
        let root = self.session.working_dir();
        let client = Arc::new(LspClient::start(language, command, &root).await?);
        clients.insert(language.to_string(), Arc::clone(&client));
        Ok(client)
    }

    /// Any running client, for queries not tied to a file.
    pub async fn any_running(&self) -> Option<Arc<LspClient>> {
        let clients = self.clients.lock().await;
        let mut languages: Vec<&String> = clients.keys().collect();
        languages.sort();
        languages.first().and_then(|l| clients.get(*l)).cloned()
    }

    pub async fn running(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Stop every running server.
    pub async fn shutdown(&self) {
        let clients: Vec<(String, Arc<LspClient>)> = self.clients.lock().await.drain().collect();
        for (language, client) in clients {
            match Arc::try_unwrap(client) {
                Ok(client) => client.shutdown().await,
                // Still borrowed by an in-flight call; its Drop kills it.
                Err(_) => warn!("Language server for {} still in use at shutdown", language),
            }
            info!("Stopped language server for {}", language);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ShellSession;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_common_languages() {
        let servers = default_servers();
        assert_eq!(servers["rust"], "rust-analyzer");
        assert_eq!(servers["javascript"], servers["typescript"]);
        assert_eq!(servers["cpp"], "clangd");
    }

    #[tokio::test]
    async fn unconfigured_language_is_rejected() {
        let dir = tempdir().unwrap();
        let pool = LspPool::new(
            BTreeMap::new(),
            SessionHandle::new(ShellSession::new(dir.path())),
        );

        let err = pool.client_for(Path::new("main.rs")).await.err().unwrap();

        assert!(matches!(err, LspError::NoServer(ref l) if l == "rust"));
        assert_eq!(pool.running().await, 0);
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let dir = tempdir().unwrap();
        let mut servers = BTreeMap::new();
        servers.insert("python".to_string(), "no-such-language-server-xyz".to_string());
        let pool = LspPool::new(servers, SessionHandle::new(ShellSession::new(dir.path())));

        let err = pool.client_for(Path::new("app.py")).await.err().unwrap();

        assert!(matches!(err, LspError::NotInstalled(ref p) if p == "no-such-language-server-xyz"));
    }

    #[tokio::test]
    async fn shutdown_with_nothing_running() {
        let dir = tempdir().unwrap();
        let pool = LspPool::new(default_servers(), SessionHandle::new(ShellSession::new(dir.path())));
        pool.shutdown().await;
        assert!(pool.any_running().await.is_none());
    }
}
