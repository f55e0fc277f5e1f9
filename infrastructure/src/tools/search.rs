//! Search and listing tools: grep, find_files, list_dir, tree

use super::context::ToolContext;
use glob::Pattern;
use regex::Regex;
use shellpilot_domain::{ToolCall, ToolError};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

/// Tool name constants
pub const GREP: &str = "grep";
pub const FIND_FILES: &str = "find_files";
pub const LIST_DIR: &str = "list_dir";
pub const TREE: &str = "tree";

/// Maximum number of results for `find_files`
const MAX_RESULTS: usize = 1000;

/// Maximum file size for grep (5 MB)
const MAX_GREP_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Bytes sniffed for a NUL to decide a file is binary.
const BINARY_SNIFF_BYTES: usize = 8192;

/// Every entry under `root` (not `root` itself), depth-first in name
/// order. Ignored directories are pruned and symlinks are not followed.
pub(crate) fn walk_entries<'a>(
    root: &Path,
    ctx: &'a ToolContext,
) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            e.depth() == 0
                || !(e.file_type().is_dir() && ctx.is_ignored(&e.file_name().to_string_lossy()))
        })
        .filter_map(Result::ok)
}

/// How a found path is shown: relative to the search root, prefixed with
/// the root as the caller wrote it.
fn display_path(root: &Path, shown_root: &str, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    if shown_root == "." || shown_root == "./" {
        rel.display().to_string()
    } else {
        Path::new(shown_root).join(rel).display().to_string()
    }
}

fn existing_path(ctx: &ToolContext, shown: &str) -> Result<PathBuf, ToolError> {
    let path = ctx.resolve(shown);
    if path.exists() {
        Ok(path)
    } else {
        Err(ToolError::not_found(shown))
    }
}

pub(crate) fn is_binary(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return true;
    };
    let mut head = Vec::with_capacity(BINARY_SNIFF_BYTES);
    if file
        .take(BINARY_SNIFF_BYTES as u64)
        .read_to_end(&mut head)
        .is_err()
    {
        return true;
    }
    head.contains(&0)
}

/// Recursive regex search. Stops at the line cap, the byte cap or the
/// deadline, whichever comes first.
pub fn grep(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let pattern = call
        .require_string("pattern")
        .map_err(ToolError::invalid_argument)?;
    let shown = call.get_string("path").unwrap_or(".");
    let root = existing_path(ctx, shown)?;
    let regex = Regex::new(pattern)
        .map_err(|e| ToolError::invalid_argument(format!("Invalid regex pattern: {}", e)))?;

    let settings = &ctx.settings;
    let max_lines = call
        .get_i64("max_results")
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(settings.search_max_lines)
        .min(settings.search_max_lines);
    let started = Instant::now();

    let mut results: Vec<String> = Vec::new();
    let mut bytes = 0usize;
    let mut stop: Option<String> = None;

    let mut search_file = |path: &Path| -> ControlFlow<()> {
        if started.elapsed() > settings.search_timeout {
            stop = Some(format!(
                "... (search timed out after {}s, partial results)",
                settings.search_timeout.as_secs()
            ));
            return ControlFlow::Break(());
        }
        let too_big = fs::metadata(path)
            .map(|m| m.len() > MAX_GREP_FILE_SIZE)
            .unwrap_or(true);
        if too_big || is_binary(path) {
            return ControlFlow::Continue(());
        }
        let Ok(content) = fs::read_to_string(path) else {
            return ControlFlow::Continue(());
        };
        let file_display = if path == root.as_path() {
            shown.to_string()
        } else {
            display_path(&root, shown, path)
        };
        for (i, line) in content.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            let hit = format!("{}:{}: {}", file_display, i + 1, line);
            if bytes + hit.len() > settings.search_max_bytes {
                stop = Some(format!(
                    "... (output limited to {} bytes)",
                    settings.search_max_bytes
                ));
                return ControlFlow::Break(());
            }
            bytes += hit.len() + 1;
            results.push(hit);
            if results.len() >= max_lines {
                stop = Some(format!("... (limited to {} matches)", max_lines));
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    };

    if root.is_file() {
        let _ = search_file(&root);
    } else {
        for entry in walk_entries(&root, ctx) {
            if !entry.file_type().is_dir() && search_file(entry.path()).is_break() {
                break;
            }
        }
    }

    if results.is_empty() {
        return match stop {
            Some(note) if note.contains("timed out") => {
                Err(ToolError::timeout(format!("grep {}", pattern)))
            }
            _ => Ok("No matches found".to_string()),
        };
    }

    let mut output = results.join("\n");
    if let Some(note) = stop {
        output.push('\n');
        output.push_str(&note);
    }
    Ok(output)
}

/// Recursive glob match against file and directory names.
pub fn find_files(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let pattern = call
        .require_string("pattern")
        .map_err(ToolError::invalid_argument)?;
    let shown = call.get_string("path").unwrap_or(".");
    let root = existing_path(ctx, shown)?;
    let matcher = Pattern::new(pattern)
        .map_err(|e| ToolError::invalid_argument(format!("Invalid glob pattern: {}", e)))?;

    let mut results = Vec::new();
    for entry in walk_entries(&root, ctx) {
        if matcher.matches(&entry.file_name().to_string_lossy()) {
            results.push(display_path(&root, shown, entry.path()));
        }
        if results.len() >= MAX_RESULTS {
            break;
        }
    }

    if results.is_empty() {
        return Ok("No files found".to_string());
    }
    let mut output = results.join("\n");
    if results.len() >= MAX_RESULTS {
        output.push_str(&format!("\n... (limited to {} results)", MAX_RESULTS));
    }
    Ok(output)
}

pub fn list_dir(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = call.get_string("path").unwrap_or(".");
    let path = ctx.resolve(shown);
    let entries = fs::read_dir(&path).map_err(|e| ToolError::from_io(&e, shown))?;

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                format!("{}/", name)
            } else {
                name
            }
        })
        .collect();
    names.sort();

    if names.is_empty() {
        Ok("(empty directory)".to_string())
    } else {
        Ok(names.join("\n"))
    }
}

/// Directory tree rendering with `├──` / `└──` connectors.
pub fn tree(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let shown = call.get_string("path").unwrap_or(".");
    let root = existing_path(ctx, shown)?;
    if !root.is_dir() {
        return Err(ToolError::invalid_argument(format!(
            "{} is not a directory",
            shown
        )));
    }
    let max_depth = call
        .get_i64("max_depth")
        .filter(|d| *d > 0)
        .map(|d| d as usize)
        .unwrap_or(ctx.settings.tree_max_depth);

    let mut children: HashMap<PathBuf, Vec<DirEntry>> = HashMap::new();
    let entries = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !ctx.is_ignored(&e.file_name().to_string_lossy()))
        .filter_map(Result::ok);
    for entry in entries {
        let parent = entry.path().parent().map(Path::to_path_buf).unwrap_or_default();
        children.entry(parent).or_default().push(entry);
    }

    let mut lines = vec![shown.to_string()];
    let mut counts = (0usize, 0usize);
    render_tree(&root, &children, "", &mut lines, &mut counts);
    lines.push(String::new());
    lines.push(format!("{} directories, {} files", counts.0, counts.1));
    Ok(lines.join("\n"))
}

fn render_tree(
    dir: &Path,
    children: &HashMap<PathBuf, Vec<DirEntry>>,
    prefix: &str,
    lines: &mut Vec<String>,
    counts: &mut (usize, usize),
) {
    let Some(entries) = children.get(dir) else {
        return;
    };
    let last = entries.len().saturating_sub(1);
    for (i, entry) in entries.iter().enumerate() {
        let (connector, extension) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_dir() {
            counts.0 += 1;
            lines.push(format!("{}{}{}/", prefix, connector, name));
            let child_prefix = format!("{}{}", prefix, extension);
            render_tree(entry.path(), children, &child_prefix, lines, counts);
        } else {
            counts.1 += 1;
            lines.push(format!("{}{}{}", prefix, connector, name));
        }
    }
}
