//! Code tools: execute_code, code_stats, install_package

use super::command::into_tool_result;
use super::context::ToolContext;
use super::search::{is_binary, walk_entries};
use crate::shell::run_captured;
use regex::Regex;
use shellpilot_domain::{ToolCall, ToolError};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Tool name constants
pub const EXECUTE_CODE: &str = "execute_code";
pub const CODE_STATS: &str = "code_stats";
pub const INSTALL_PACKAGE: &str = "install_package";

/// Symbols listed by `code_stats` before the list is cut.
const MAX_SYMBOLS: usize = 100;

/// `{file}` is the quoted source path, `{bin}` the quoted path of a compiled
/// binary next to it.
fn run_template(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "py" => "python3 {file}",
        "js" => "node {file}",
        "ts" => "npx ts-node {file}",
        "rb" => "ruby {file}",
        "sh" => "bash {file}",
        "go" => "go run {file}",
        "rs" => "rustc {file} -o {bin} && {bin}",
        "c" => "gcc {file} -o {bin} && {bin}",
        "cpp" => "g++ {file} -o {bin} && {bin}",
        "java" => "java {file}",
        _ => return None,
    })
}

fn install_template(manager: &str) -> Option<&'static str> {
    Some(match manager {
        "npm" => "npm install {pkg}",
        "pip" => "pip install {pkg}",
        "cargo" => "cargo add {pkg}",
        "gem" => "gem install {pkg}",
        "go" => "go get {pkg}",
        "apt" => "sudo apt-get install -y {pkg}",
        "brew" => "brew install {pkg}",
        _ => return None,
    })
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

pub async fn execute_code(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = call
        .require_string("path")
        .map_err(ToolError::invalid_argument)?;
    let path = ctx.resolve(shown);
    if !path.is_file() {
        return Err(ToolError::not_found(shown));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let template = run_template(&extension).ok_or_else(|| {
        ToolError::invalid_argument(format!("Unsupported file type: .{}", extension))
    })?;

    let binary = path.with_extension("");
    let command = template
        .replace("{file}", &shell_quote(&path.to_string_lossy()))
        .replace("{bin}", &shell_quote(&binary.to_string_lossy()));

    let limits = ctx.capture_limits(None);
    let out = run_captured(&command, &ctx.session.snapshot(), limits).await;
    into_tool_result(out, limits.timeout, shown)
}

pub async fn install_package(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let manager = call
        .require_string("manager")
        .map_err(ToolError::invalid_argument)?;
    let package = call
        .require_string("package")
        .map_err(ToolError::invalid_argument)?;
    if package.trim().is_empty() {
        return Err(ToolError::invalid_argument("package must not be empty"));
    }
    let template = install_template(manager).ok_or_else(|| {
        ToolError::invalid_argument(format!(
            "Unknown package manager: {} (expected npm, pip, cargo, gem, go, apt or brew)",
            manager
        ))
    })?;

    let command = template.replace("{pkg}", &shell_quote(package.trim()));
    let limits = ctx.capture_limits(None);
    let out = run_captured(&command, &ctx.session.snapshot(), limits).await;
    into_tool_result(out, limits.timeout, &command)
}

fn symbol_regex() -> Result<Regex, ToolError> {
    Regex::new(
        r"^\s*(?:export\s+)?(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(fn|struct|enum|trait|class|def|function|interface)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .map_err(|e| ToolError::execution_failed(format!("symbol pattern: {}", e)))
}

#[derive(Default)]
struct Stats {
    by_extension: BTreeMap<String, (usize, usize)>,
    files: usize,
    lines: usize,
    symbols: Vec<String>,
    more_symbols: usize,
}

impl Stats {
    fn add_file(&mut self, path: &Path, shown: String, symbols: &Regex) {
        if is_binary(path) {
            return;
        }
        let Ok(content) = fs::read_to_string(path) else {
            return;
        };
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| "(none)".to_string());
        let line_count = content.lines().count();

        let entry = self.by_extension.entry(extension).or_default();
        entry.0 += 1;
        entry.1 += line_count;
        self.files += 1;
        self.lines += line_count;

        for (i, line) in content.lines().enumerate() {
            if let Some(caps) = symbols.captures(line) {
                if self.symbols.len() < MAX_SYMBOLS {
                    self.symbols
                        .push(format!("  {}:{}: {} {}", shown, i + 1, &caps[1], &caps[2]));
                } else {
                    self.more_symbols += 1;
                }
            }
        }
    }

    fn render(&self) -> String {
        let mut out = vec![
            format!("Files: {}", self.files),
            format!("Lines: {}", self.lines),
            "By extension:".to_string(),
        ];
        for (ext, (files, lines)) in &self.by_extension {
            out.push(format!("  {}: {} files, {} lines", ext, files, lines));
        }
        if !self.symbols.is_empty() {
            out.push("Symbols:".to_string());
            out.extend(self.symbols.iter().cloned());
            if self.more_symbols > 0 {
                out.push(format!("  ... {} more", self.more_symbols));
            }
        }
        out.join("\n")
    }
}

/// Files by extension, line counts and a function/class/struct scan.
pub fn code_stats(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = call.get_string("path").unwrap_or(".");
    let root = ctx.resolve(shown);
    if !root.exists() {
        return Err(ToolError::not_found(shown));
    }
    let symbols = symbol_regex()?;
    let mut stats = Stats::default();

    if root.is_file() {
        stats.add_file(&root, shown.to_string(), &symbols);
    } else {
        for entry in walk_entries(&root, ctx) {
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(&root).unwrap_or(path);
            stats.add_file(path, rel.display().to_string(), &symbols);
        }
    }
    Ok(stats.render())
}
