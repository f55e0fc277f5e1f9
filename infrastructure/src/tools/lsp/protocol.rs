//! JSON-RPC 2.0 framing and LSP result rendering.
//!
//! Frames are `Content-Length: N\r\n\r\n` followed by N bytes of JSON.
//! Rendering turns the handful of LSP result shapes the `code_intel`
//! tool asks for into short plain-text listings with 1-based positions.

use super::LspError;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
}

/// Classification of an incoming frame.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Answer to one of our requests.
    Response { id: u64 },
    /// The server asking us something; it expects a reply.
    ServerRequest { id: Value },
    Notification,
}

pub fn classify_message(json: &Value) -> MessageKind {
    let method = json.get("method").and_then(|m| m.as_str());
    match (json.get("id"), method) {
        (Some(id), Some(_)) => MessageKind::ServerRequest { id: id.clone() },
        (Some(id), None) => match id.as_u64() {
            Some(id) => MessageKind::Response { id },
            None => MessageKind::Notification,
        },
        _ => MessageKind::Notification,
    }
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), LspError> {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. `Ok(None)` on a clean end of stream.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Value>, LspError> {
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some(len) = trimmed.strip_prefix("Content-Length:") {
            content_length = len.trim().parse().ok();
        }
    }

    let len = content_length.unwrap_or(0);
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

/// `file://` URI for an absolute path.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Path part of a `file://` URI, shown relative to `root` when inside it.
pub fn display_uri(uri: &str, root: &Path) -> String {
    let path = uri.strip_prefix("file://").unwrap_or(uri);
    let path = Path::new(path);
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Extension → LSP `languageId`.
pub fn language_id(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "c" => "c",
        "cpp" | "cc" | "cxx" | "h" | "hpp" => "cpp",
        "html" | "htm" => "html",
        "css" => "css",
        _ => "plaintext",
    }
}

fn symbol_kind(kind: u64) -> &'static str {
    match kind {
        1 => "file",
        2 => "module",
        3 => "namespace",
        4 => "package",
        5 => "class",
        6 => "method",
        7 => "property",
        8 => "field",
        9 => "constructor",
        10 => "enum",
        11 => "interface",
        12 => "function",
        13 => "variable",
        14 => "constant",
        22 => "enum_member",
        23 => "struct",
        26 => "type_parameter",
        _ => "symbol",
    }
}

/// `(line, character)` of a range start, 1-based.
fn range_start(range: &Value) -> (u64, u64) {
    let start = &range["start"];
    (
        start["line"].as_u64().unwrap_or(0) + 1,
        start["character"].as_u64().unwrap_or(0) + 1,
    )
}

/// `Location`, `Location[]` or `LocationLink[]` as `file:line:col` lines.
pub fn render_locations(result: &Value, root: &Path) -> String {
    let items: Vec<&Value> = match result {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        single => vec![single],
    };
    let lines: Vec<String> = items
        .into_iter()
        .filter_map(|loc| {
            let uri = loc.get("uri").or_else(|| loc.get("targetUri"))?.as_str()?;
            let range = loc
                .get("range")
                .or_else(|| loc.get("targetSelectionRange"))?;
            let (line, col) = range_start(range);
            Some(format!("{}:{}:{}", display_uri(uri, root), line, col))
        })
        .collect();
    if lines.is_empty() {
        "No results".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn render_hover(result: &Value) -> String {
    fn text(contents: &Value) -> Option<String> {
        match contents {
            Value::String(s) => Some(s.clone()),
            Value::Array(parts) => {
                let parts: Vec<String> = parts.iter().filter_map(text).collect();
                (!parts.is_empty()).then(|| parts.join("\n\n"))
            }
            Value::Object(obj) => obj.get("value").and_then(|v| v.as_str()).map(String::from),
            _ => None,
        }
    }
    result
        .get("contents")
        .and_then(text)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "No hover information".to_string())
}

/// `DocumentSymbol[]` (nested) or `SymbolInformation[]` (flat).
pub fn render_symbols(result: &Value, root: &Path) -> String {
    fn walk(symbols: &[Value], depth: usize, root: &Path, out: &mut Vec<String>) {
        for symbol in symbols {
            let name = symbol["name"].as_str().unwrap_or("?");
            let kind = symbol_kind(symbol["kind"].as_u64().unwrap_or(0));
            let indent = "  ".repeat(depth);
            if let Some(location) = symbol.get("location") {
                let uri = location["uri"].as_str().unwrap_or("");
                let (line, _) = range_start(&location["range"]);
                out.push(format!(
                    "{}{} {}  {}:{}",
                    indent,
                    kind,
                    name,
                    display_uri(uri, root),
                    line
                ));
            } else {
                let (line, _) = range_start(&symbol["range"]);
                out.push(format!("{}{} {} (line {})", indent, kind, name, line));
            }
            if let Some(children) = symbol.get("children").and_then(|c| c.as_array()) {
                walk(children, depth + 1, root, out);
            }
        }
    }

    let mut out = Vec::new();
    if let Some(symbols) = result.as_array() {
        walk(symbols, 0, root, &mut out);
    }
    if out.is_empty() {
        "No symbols found".to_string()
    } else {
        out.join("\n")
    }
}

pub fn render_diagnostics(diagnostics: &[Value]) -> String {
    if diagnostics.is_empty() {
        return "No diagnostics".to_string();
    }
    diagnostics
        .iter()
        .map(|d| {
            let (line, col) = range_start(&d["range"]);
            let severity = match d["severity"].as_u64() {
                Some(1) => "error",
                Some(2) => "warning",
                Some(3) => "info",
                Some(4) => "hint",
                _ => "note",
            };
            let message = d["message"].as_str().unwrap_or("");
            match d["source"].as_str() {
                Some(source) => format!("{}:{} {} [{}]: {}", line, col, severity, source, message),
                None => format!("{}:{} {}: {}", line, col, severity, message),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary of a `WorkspaceEdit`: which files would change and how often.
pub fn render_workspace_edit(result: &Value, root: &Path) -> String {
    let mut files: Vec<(String, usize)> = Vec::new();
    if let Some(changes) = result.get("changes").and_then(|c| c.as_object()) {
        for (uri, edits) in changes {
            let count = edits.as_array().map(Vec::len).unwrap_or(0);
            files.push((display_uri(uri, root), count));
        }
    }
    if let Some(doc_changes) = result.get("documentChanges").and_then(|c| c.as_array()) {
        for change in doc_changes {
            if let Some(uri) = change["textDocument"]["uri"].as_str() {
                let count = change["edits"].as_array().map(Vec::len).unwrap_or(0);
                files.push((display_uri(uri, root), count));
            }
        }
    }
    if files.is_empty() {
        return "No edits".to_string();
    }
    let total: usize = files.iter().map(|(_, n)| n).sum();
    let mut out = vec![format!("{} edits in {} files:", total, files.len())];
    for (file, count) in files {
        out.push(format!("  {}: {} edits", file, count));
    }
    out.join("\n")
}
