//! One language server child process spoken to over stdio.
//!
//! A background reader task owns stdout exclusively. Responses are routed
//! to the waiting request by id, `publishDiagnostics` notifications are kept
//! per document URI, and server-initiated requests get a `null` reply so
//! servers that block on them keep going.

use super::LspError;
use super::protocol::{
    JsonRpcNotification, JsonRpcRequest, MessageKind, classify_message, file_uri, language_id,
    read_frame, write_frame,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, Notify, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Deadline for a single request/response round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for the polite `shutdown`/`exit` exchange before the kill.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

type PendingMap = Arc<std::sync::Mutex<HashMap<u64, oneshot::Sender<Value>>>>;
type Writer = Arc<Mutex<BufWriter<ChildStdin>>>;

#[derive(Default)]
struct Diagnostics {
    by_uri: std::sync::Mutex<HashMap<String, Vec<Value>>>,
    published: Notify,
}

pub struct LspClient {
    language: String,
    child: Child,
    writer: Writer,
    pending: PendingMap,
    diagnostics: Arc<Diagnostics>,
    /// Open documents and their current version.
    documents: Mutex<HashMap<String, i64>>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl LspClient {
    /// Spawn `command_line` (program plus arguments) and run the
    /// `initialize` handshake rooted at `root`.
    pub async fn start(language: &str, command_line: &str, root: &Path) -> Result<Self, LspError> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| LspError::NoServer(language.to_string()))?;
        which::which(program).map_err(|_| LspError::NotInstalled(program.to_string()))?;

        debug!("Spawning language server for {}: {}", language, command_line);
        let mut cmd = Command::new(program);
        cmd.args(parts)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Linux: have the kernel terminate the server if we die first.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(LspError::Spawn)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::Spawn(std::io::Error::other("failed to capture stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::Spawn(std::io::Error::other("failed to capture stdout")))?;

        let writer: Writer = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: PendingMap = Arc::default();
        let diagnostics: Arc<Diagnostics> = Arc::default();

        let reader = tokio::spawn(Self::reader_loop(
            language.to_string(),
            stdout,
            Arc::clone(&pending),
            Arc::clone(&diagnostics),
            Arc::clone(&writer),
        ));

        let client = Self {
            language: language.to_string(),
            child,
            writer,
            pending,
            diagnostics,
            documents: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            reader,
        };

        let root_uri = file_uri(root);
        client
            .request(
                "initialize",
                json!({
                    "processId": std::process::id(),
                    "rootUri": root_uri,
                    "workspaceFolders": [{"uri": root_uri, "name": "root"}],
                    "capabilities": {
                        "textDocument": {
                            "hover": {"contentFormat": ["plaintext", "markdown"]},
                            "documentSymbol": {"hierarchicalDocumentSymbolSupport": true},
                            "publishDiagnostics": {"relatedInformation": false},
                            "rename": {"prepareSupport": false}
                        },
                        "workspace": {"symbol": {}, "workspaceFolders": true}
                    }
                }),
            )
            .await?;
        client.notify("initialized", json!({})).await?;

        info!("Language server for {} initialized", language);
        Ok(client)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    async fn reader_loop(
        language: String,
        stdout: ChildStdout,
        pending: PendingMap,
        diagnostics: Arc<Diagnostics>,
        writer: Writer,
    ) {
        let mut reader = BufReader::new(stdout);
        loop {
            let message = match read_frame(&mut reader).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("Language server for {} closed stdout", language);
                    break;
                }
                Err(e) => {
                    warn!("Language server for {}: bad frame: {}", language, e);
                    break;
                }
            };
            trace!("<- {}", message);

            match classify_message(&message) {
                MessageKind::Response { id } => {
                    let waiter = pending
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .remove(&id);
                    if let Some(tx) = waiter {
                        let _ = tx.send(message);
                    }
                }
                MessageKind::ServerRequest { id } => {
                    let reply = json!({"jsonrpc": "2.0", "id": id, "result": Value::Null});
                    let body = reply.to_string();
                    let mut w = writer.lock().await;
                    if let Err(e) = write_frame(&mut *w, body.as_bytes()).await {
                        warn!("Language server for {}: reply failed: {}", language, e);
                    }
                }
                MessageKind::Notification => {
                    if message["method"] == "textDocument/publishDiagnostics" {
                        let params = &message["params"];
                        if let Some(uri) = params["uri"].as_str() {
                            let list = params["diagnostics"].as_array().cloned().unwrap_or_default();
                            diagnostics
                                .by_uri
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .insert(uri.to_string(), list);
                            diagnostics.published.notify_waiters();
                        }
                    }
                }
            }
        }

        // Wake every pending request; dropping the senders yields Closed.
        pending.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    async fn send(&self, body: String) -> Result<(), LspError> {
        trace!("-> {}", body);
        let mut w = self.writer.lock().await;
        write_frame(&mut *w, body.as_bytes()).await
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, LspError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);

        let body = serde_json::to_string(&JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })?;
        if let Err(e) = self.send(body).await {
            self.forget(id);
            return Err(e);
        }

        let response = match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(LspError::Closed),
            Err(_) => {
                self.forget(id);
                return Err(LspError::Timeout(method.to_string()));
            }
        };

        if let Some(error) = response.get("error") {
            return Err(LspError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"].as_str().unwrap_or("").to_string(),
            });
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    pub async fn notify(&self, method: &str, params: Value) -> Result<(), LspError> {
        let body = serde_json::to_string(&JsonRpcNotification {
            jsonrpc: "2.0",
            method,
            params,
        })?;
        self.send(body).await
    }

    /// Send the current file content to the server: `didOpen` the first
    /// time, a full-text `didChange` afterwards. Returns the document URI.
    pub async fn sync_document(&self, path: &Path) -> Result<String, LspError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LspError::InvalidPath(format!("{}: {}", path.display(), e)))?;
        let uri = file_uri(path);

        let mut documents = self.documents.lock().await;
        match documents.get_mut(&uri) {
            Some(version) => {
                *version += 1;
                self.notify(
                    "textDocument/didChange",
                    json!({
                        "textDocument": {"uri": uri, "version": *version},
                        "contentChanges": [{"text": text}]
                    }),
                )
                .await?;
            }
            None => {
                self.notify(
                    "textDocument/didOpen",
                    json!({
                        "textDocument": {
                            "uri": uri,
                            "languageId": language_id(path),
                            "version": 1,
                            "text": text
                        }
                    }),
                )
                .await?;
                documents.insert(uri.clone(), 1);
            }
        }
        Ok(uri)
    }

    /// Forget stored diagnostics for `uri` so the next wait sees a fresh
    /// publication.
    pub fn clear_diagnostics(&self, uri: &str) {
        self.diagnostics
            .by_uri
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(uri);
    }

    /// Diagnostics published for `uri`, waiting up to `wait` for the first
    /// publication. Empty when none arrived in time.
    pub async fn diagnostics(&self, uri: &str, wait: Duration) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let published = self.diagnostics.published.notified();
            if let Some(list) = self
                .diagnostics
                .by_uri
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(uri)
            {
                return list.clone();
            }
            if tokio::time::timeout_at(deadline, published).await.is_err() {
                return Vec::new();
            }
        }
    }

    /// `shutdown` + `exit` under a short timeout, then kill.
    pub async fn shutdown(mut self) {
        let polite = async {
            self.request("shutdown", Value::Null).await?;
            self.notify("exit", Value::Null).await
        };
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, polite).await {
            Ok(Ok(())) => debug!("Language server for {} shut down", self.language),
            Ok(Err(e)) => debug!("Language server for {} shutdown: {}", self.language, e),
            Err(_) => debug!("Language server for {} ignored shutdown", self.language),
        }
        let _ = self.child.kill().await;
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        self.reader.abort();
        let _ = self.child.start_kill();
    }
}
