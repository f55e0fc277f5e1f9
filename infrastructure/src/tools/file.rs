//! File tools: read_file, write_file, append_file, read_lines, str_replace,
//! insert_lines
//!
//! Every tool that changes a file returns the rendered change report from
//! the diff engine instead of a bare success message.

use super::context::ToolContext;
use shellpilot_domain::diff::split_lines;
use shellpilot_domain::tool::value_objects::NOT_FOUND;
use shellpilot_domain::{ToolCall, ToolError, format_change};
use std::fs;
use std::path::Path;

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const APPEND_FILE: &str = "append_file";
pub const READ_LINES: &str = "read_lines";
pub const STR_REPLACE: &str = "str_replace";
pub const INSERT_LINES: &str = "insert_lines";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

fn require<'a>(call: &'a ToolCall, key: &str) -> Result<&'a str, ToolError> {
    call.require_string(key).map_err(ToolError::invalid_argument)
}

fn read_text(path: &Path, shown: &str) -> Result<String, ToolError> {
    let metadata = fs::metadata(path).map_err(|e| ToolError::from_io(&e, shown))?;
    if metadata.is_dir() {
        return Err(ToolError::invalid_argument(format!(
            "{} is a directory",
            shown
        )));
    }
    if metadata.len() > MAX_READ_SIZE {
        return Err(ToolError::execution_failed(format!(
            "File too large: {} bytes (max: {} bytes)",
            metadata.len(),
            MAX_READ_SIZE
        )));
    }
    fs::read_to_string(path).map_err(|e| ToolError::from_io(&e, shown))
}

/// Current content, or `None` when the file does not exist yet.
fn read_existing(path: &Path, shown: &str) -> Result<Option<String>, ToolError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ToolError::from_io(&e, shown)),
    }
}

fn write_text(path: &Path, shown: &str, content: &str) -> Result<(), ToolError> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| ToolError::from_io(&e, shown))?;
    }
    fs::write(path, content).map_err(|e| ToolError::from_io(&e, shown))
}

fn change_report(old: Option<&str>, new: &str, shown: &str) -> String {
    let report = format_change(old, new, shown);
    if report.is_empty() {
        format!("No changes to {}", shown)
    } else {
        report
    }
}

pub fn read_file(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = require(call, "path")?;
    read_text(&ctx.resolve(shown), shown)
}

pub fn write_file(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = require(call, "path")?;
    let content = require(call, "content")?;
    let path = ctx.resolve(shown);

    let old = read_existing(&path, shown)?;
    write_text(&path, shown, content)?;
    Ok(change_report(old.as_deref(), content, shown))
}

pub fn append_file(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = require(call, "path")?;
    let addition = require(call, "content")?;
    let path = ctx.resolve(shown);

    let old = read_existing(&path, shown)?;
    let new = format!("{}{}", old.as_deref().unwrap_or(""), addition);
    write_text(&path, shown, &new)?;
    Ok(change_report(old.as_deref(), &new, shown))
}

/// 1-based inclusive range, clamped to the file. Lines render as
/// `NNNN │ text`.
pub fn read_lines(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = require(call, "path")?;
    let content = read_text(&ctx.resolve(shown), shown)?;
    let lines = split_lines(&content);
    if lines.is_empty() {
        return Ok(format!("{} is empty", shown));
    }

    let start = call.get_i64("start").unwrap_or(1).max(1) as usize;
    let end = call
        .get_i64("end")
        .map(|e| e.max(0) as usize)
        .unwrap_or(lines.len())
        .min(lines.len());
    if start > lines.len() {
        return Err(ToolError::invalid_argument(format!(
            "start line {} is past the end of {} ({} lines)",
            start,
            shown,
            lines.len()
        )));
    }
    if end < start {
        return Err(ToolError::invalid_argument(format!(
            "end line {} is before start line {}",
            end, start
        )));
    }

    Ok(lines[start - 1..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>4} │ {}", start + i, line))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Replace the single occurrence of `old_str`. Zero or several occurrences
/// leave the file untouched.
pub fn str_replace(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = require(call, "path")?;
    let old_str = require(call, "old_str")?;
    let new_str = require(call, "new_str")?;
    if old_str.is_empty() {
        return Err(ToolError::invalid_argument("old_str must not be empty"));
    }

    let path = ctx.resolve(shown);
    let content = read_text(&path, shown)?;
    match content.matches(old_str).count() {
        0 => Err(ToolError::new(
            NOT_FOUND,
            format!("old_str not found in {}", shown),
        )),
        1 => {
            let updated = content.replacen(old_str, new_str, 1);
            write_text(&path, shown, &updated)?;
            Ok(change_report(Some(&content), &updated, shown))
        }
        n => Err(ToolError::ambiguous_match(format!(
            "old_str matches {} times in {}; it must match exactly once",
            n, shown
        ))),
    }
}

/// Insert `content` after line `line`; 0 inserts at the top.
pub fn insert_lines(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = require(call, "path")?;
    let addition = require(call, "content")?;
    let after = call
        .get_i64("line")
        .ok_or_else(|| ToolError::invalid_argument("Missing required argument: line"))?;
    if after < 0 {
        return Err(ToolError::invalid_argument("line must be 0 or greater"));
    }
    let after = after as usize;

    let path = ctx.resolve(shown);
    let content = read_text(&path, shown)?;
    let mut lines = split_lines(&content);
    if after > lines.len() {
        return Err(ToolError::invalid_argument(format!(
            "line {} is past the end of {} ({} lines)",
            after,
            shown,
            lines.len()
        )));
    }

    let inserted: Vec<&str> = addition.split('\n').collect();
    lines.splice(after..after, inserted);
    let updated = lines.join("\n");
    write_text(&path, shown, &updated)?;
    Ok(change_report(Some(&content), &updated, shown))
}
