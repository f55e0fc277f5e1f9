//! Code intelligence through language servers: the `code_intel` tool.
//!
//! Positions taken from and shown to the model are 1-based, matching the
//! numbering `read_lines` and `grep` print. They are converted to the
//! 0-based LSP form at the wire.

pub mod client;
pub mod pool;
pub mod protocol;

pub use client::LspClient;
pub use pool::{LspPool, default_servers};

use super::context::ToolContext;
use serde_json::json;
use shellpilot_domain::{ToolCall, ToolError};
use std::time::Duration;
use thiserror::Error;

/// Tool name constant
pub const CODE_INTEL: &str = "code_intel";

/// How long `diagnostics` waits for the server to publish.
const DIAGNOSTICS_WAIT: Duration = Duration::from_secs(1);

const ACTIONS: &str =
    "definition, references, hover, symbols, diagnostics, rename, workspace_symbols";

#[derive(Error, Debug)]
pub enum LspError {
    #[error("No language server configured for {0}")]
    NoServer(String),

    #[error("Language server not installed: {0}")]
    NotInstalled(String),

    #[error("Failed to start language server: {0}")]
    Spawn(std::io::Error),

    #[error("Language server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Language server error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Language server did not answer {0}")]
    Timeout(String),

    #[error("Language server exited")]
    Closed,

    #[error("Cannot open document {0}")]
    InvalidPath(String),
}

impl From<LspError> for ToolError {
    fn from(err: LspError) -> Self {
        match err {
            LspError::NoServer(_) | LspError::NotInstalled(_) | LspError::InvalidPath(_) => {
                ToolError::invalid_argument(err.to_string())
            }
            LspError::Timeout(method) => ToolError::timeout(format!("language server {}", method)),
            other => ToolError::execution_failed(other.to_string()),
        }
    }
}

/// 1-based `line`/`character` arguments as an LSP position.
fn position(call: &ToolCall) -> Result<serde_json::Value, ToolError> {
    let line = call
        .get_i64("line")
        .ok_or_else(|| ToolError::invalid_argument("Missing required parameter: line"))?;
    if line < 1 {
        return Err(ToolError::invalid_argument("line is 1-based"));
    }
    let character = call.get_i64("character").unwrap_or(1).max(1);
    Ok(json!({"line": line - 1, "character": character - 1}))
}

pub async fn code_intel(
    pool: &LspPool,
    ctx: &ToolContext,
    call: &ToolCall,
) -> Result<String, ToolError> {
    let action = call
        .require_string("action")
        .map_err(ToolError::invalid_argument)?;
    let root = ctx.session.working_dir();

    if action == "workspace_symbols" {
        let query = call.get_string("query").unwrap_or("");
        let client = match call.get_string("path") {
            Some(path) => pool.client_for(&ctx.resolve(path)).await?,
            None => pool.any_running().await.ok_or_else(|| {
                ToolError::invalid_argument(
                    "No language server running; pass a path to pick one for workspace_symbols",
                )
            })?,
        };
        let result = client
            .request("workspace/symbol", json!({"query": query}))
            .await?;
        return Ok(protocol::render_symbols(&result, &root));
    }

    let shown = call
        .require_string("path")
        .map_err(ToolError::invalid_argument)?;
    let path = ctx.resolve(shown);
    if !path.is_file() {
        return Err(ToolError::not_found(shown));
    }
    let client = pool.client_for(&path).await?;

    if action == "diagnostics" {
        client.clear_diagnostics(&protocol::file_uri(&path));
        let uri = client.sync_document(&path).await?;
        let diagnostics = client.diagnostics(&uri, DIAGNOSTICS_WAIT).await;
        return Ok(protocol::render_diagnostics(&diagnostics));
    }

    let uri = client.sync_document(&path).await?;
    let document = json!({"uri": uri});

    let rendered = match action {
        "definition" => {
            let params = json!({"textDocument": document, "position": position(call)?});
            let result = client.request("textDocument/definition", params).await?;
            protocol::render_locations(&result, &root)
        }
        "references" => {
            let params = json!({
                "textDocument": document,
                "position": position(call)?,
                "context": {"includeDeclaration": true}
            });
            let result = client.request("textDocument/references", params).await?;
            protocol::render_locations(&result, &root)
        }
        "hover" => {
            let params = json!({"textDocument": document, "position": position(call)?});
            let result = client.request("textDocument/hover", params).await?;
            protocol::render_hover(&result)
        }
        "symbols" => {
            let params = json!({"textDocument": document});
            let result = client.request("textDocument/documentSymbol", params).await?;
            protocol::render_symbols(&result, &root)
        }
        "rename" => {
            let new_name = call
                .require_string("new_name")
                .map_err(ToolError::invalid_argument)?;
            let params = json!({
                "textDocument": document,
                "position": position(call)?,
                "newName": new_name
            });
            let result = client.request("textDocument/rename", params).await?;
            protocol::render_workspace_edit(&result, &root)
        }
        other => {
            return Err(ToolError::invalid_argument(format!(
                "Unknown action: {} (expected one of {})",
                other, ACTIONS
            )));
        }
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{SessionHandle, ShellSession};
    use crate::tools::context::ToolSettings;
    use shellpilot_domain::tool::value_objects::{INVALID_ARGUMENT, NOT_FOUND, TIMEOUT};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn position_converts_to_zero_based() {
        let call = ToolCall::new(CODE_INTEL)
            .with_arg("line", 10)
            .with_arg("character", "4");
        assert_eq!(position(&call).unwrap(), json!({"line": 9, "character": 3}));

        let call = ToolCall::new(CODE_INTEL).with_arg("line", 1);
        assert_eq!(position(&call).unwrap(), json!({"line": 0, "character": 0}));

        let err = position(&ToolCall::new(CODE_INTEL).with_arg("line", 0)).unwrap_err();
        assert_eq!(err.code, INVALID_ARGUMENT);
    }

    #[test]
    fn lsp_errors_map_to_tool_codes() {
        let err: ToolError = LspError::NoServer("go".into()).into();
        assert_eq!(err.code, INVALID_ARGUMENT);
        let err: ToolError = LspError::Timeout("textDocument/hover".into()).into();
        assert_eq!(err.code, TIMEOUT);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let session = SessionHandle::new(ShellSession::new(dir.path()));
        let ctx = ToolContext::new(session.clone(), ToolSettings::default());
        let pool = LspPool::new(BTreeMap::new(), session);

        let call = ToolCall::new(CODE_INTEL)
            .with_arg("action", "hover")
            .with_arg("path", "gone.rs")
            .with_arg("line", 1);
        let err = code_intel(&pool, &ctx, &call).await.unwrap_err();

        assert_eq!(err.code, NOT_FOUND);
    }

    #[tokio::test]
    async fn unconfigured_language_is_invalid_argument() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
        let session = SessionHandle::new(ShellSession::new(dir.path()));
        let ctx = ToolContext::new(session.clone(), ToolSettings::default());
        let pool = LspPool::new(BTreeMap::new(), session);

        let call = ToolCall::new(CODE_INTEL)
            .with_arg("action", "symbols")
            .with_arg("path", "main.rs");
        let err = code_intel(&pool, &ctx, &call).await.unwrap_err();

        assert_eq!(err.code, INVALID_ARGUMENT);
        assert_eq!(err.message, "No language server configured for rust");
    }

    #[tokio::test]
    async fn workspace_symbols_without_server_or_path() {
        let dir = tempdir().unwrap();
        let session = SessionHandle::new(ShellSession::new(dir.path()));
        let ctx = ToolContext::new(session.clone(), ToolSettings::default());
        let pool = LspPool::new(default_servers(), session);

        let call = ToolCall::new(CODE_INTEL)
            .with_arg("action", "workspace_symbols")
            .with_arg("query", "Point");
        let err = code_intel(&pool, &ctx, &call).await.unwrap_err();

        assert_eq!(err.code, INVALID_ARGUMENT);
    }
}
