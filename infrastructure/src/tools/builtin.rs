//! Registration of the built-in tool set.
//!
//! File and search tools are synchronous and run on the blocking pool;
//! process-backed tools and `code_intel` are async.

use super::code::{self, CODE_STATS, EXECUTE_CODE, INSTALL_PACKAGE};
use super::command::{self, RUN_COMMAND};
use super::context::ToolContext;
use super::file::{self, APPEND_FILE, INSERT_LINES, READ_FILE, READ_LINES, STR_REPLACE, WRITE_FILE};
use super::lsp::{self, CODE_INTEL, LspPool};
use super::registry::ToolRegistry;
use super::search::{self, FIND_FILES, GREP, LIST_DIR, TREE};
use shellpilot_domain::{ToolCall, ToolError};
use std::sync::Arc;

type SyncTool = fn(&ToolContext, &ToolCall) -> Result<String, ToolError>;

fn register_blocking(
    registry: &mut ToolRegistry,
    ctx: &ToolContext,
    name: &str,
    tool: SyncTool,
    description: &str,
) {
    let ctx = ctx.clone();
    registry.register(
        name,
        move |call: ToolCall| {
            let ctx = ctx.clone();
            async move {
                tokio::task::spawn_blocking(move || tool(&ctx, &call))
                    .await
                    .unwrap_or_else(|e| {
                        Err(ToolError::execution_failed(format!("tool task failed: {}", e)))
                    })
            }
        },
        description,
    );
}

/// A registry holding every built-in tool, sharing `ctx`'s session.
pub fn builtin_registry(ctx: ToolContext, lsp_pool: Arc<LspPool>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, ctx, lsp_pool);
    registry
}

pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    ctx: ToolContext,
    lsp_pool: Arc<LspPool>,
) {
    let r = registry;

    register_blocking(
        r,
        &ctx,
        READ_FILE,
        file::read_file,
        r#"Read file content. Params: {"path": "file.txt"}"#,
    );
    register_blocking(
        r,
        &ctx,
        WRITE_FILE,
        file::write_file,
        r#"Write to file, creating parent directories; returns a diff. Params: {"path": "file.txt", "content": "..."}"#,
    );
    register_blocking(
        r,
        &ctx,
        APPEND_FILE,
        file::append_file,
        r#"Append to file; returns a diff. Params: {"path": "file.txt", "content": "..."}"#,
    );
    register_blocking(
        r,
        &ctx,
        LIST_DIR,
        search::list_dir,
        r#"List directory. Params: {"path": "."}"#,
    );
    register_blocking(
        r,
        &ctx,
        GREP,
        search::grep,
        r#"Search in files by regex. Params: {"pattern": "TODO", "path": ".", "max_results": 50}"#,
    );
    register_blocking(
        r,
        &ctx,
        FIND_FILES,
        search::find_files,
        r#"Find files by name. Params: {"pattern": "*.js", "path": "."}"#,
    );
    register_blocking(
        r,
        &ctx,
        READ_LINES,
        file::read_lines,
        r#"Read a numbered line range (1-based, inclusive). Params: {"path": "file.txt", "start": 10, "end": 20}"#,
    );
    register_blocking(
        r,
        &ctx,
        STR_REPLACE,
        file::str_replace,
        r#"Replace text that occurs exactly once; returns a diff. Params: {"path": "file.txt", "old_str": "...", "new_str": "..."}"#,
    );
    register_blocking(
        r,
        &ctx,
        INSERT_LINES,
        file::insert_lines,
        r#"Insert lines after line N (0 = top); returns a diff. Params: {"path": "file.txt", "line": 5, "content": "..."}"#,
    );

    let c = ctx.clone();
    r.register(
        EXECUTE_CODE,
        move |call: ToolCall| {
            let c = c.clone();
            async move { code::execute_code(&c, &call).await }
        },
        r#"Run a source file by its extension (py, js, ts, rb, sh, go, rs, c, cpp, java). Params: {"path": "script.py"}"#,
    );

    let c = ctx.clone();
    r.register(
        RUN_COMMAND,
        move |call: ToolCall| {
            let c = c.clone();
            async move { command::run_command(&c, &call).await }
        },
        r#"Run a shell command in the session directory. Params: {"command": "ls -la", "timeout_secs": 30}"#,
    );

    register_blocking(
        r,
        &ctx,
        TREE,
        search::tree,
        r#"Show a directory tree. Params: {"path": ".", "max_depth": 3}"#,
    );
    register_blocking(
        r,
        &ctx,
        CODE_STATS,
        code::code_stats,
        r#"Count files and lines by extension and list functions, classes and structs. Params: {"path": "."}"#,
    );

    let c = ctx.clone();
    r.register(
        INSTALL_PACKAGE,
        move |call: ToolCall| {
            let c = c.clone();
            async move { code::install_package(&c, &call).await }
        },
        r#"Install a package (npm, pip, cargo, gem, go, apt, brew). Params: {"manager": "npm", "package": "lodash"}"#,
    );

    let c = ctx;
    let pool = Arc::clone(&lsp_pool);
    r.register(
        CODE_INTEL,
        move |call: ToolCall| {
            let c = c.clone();
            let pool = Arc::clone(&pool);
            async move { lsp::code_intel(&pool, &c, &call).await }
        },
        r#"Language-server queries; line and character are 1-based. Actions: definition, references, hover, symbols, diagnostics, rename, workspace_symbols. Params: {"action": "definition", "path": "src/main.rs", "line": 10, "character": 5, "query": "Name", "new_name": "renamed"}"#,
    );

    r.set_lsp_pool(lsp_pool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{SessionHandle, ShellSession};
    use crate::tools::context::ToolSettings;
    use crate::tools::lsp::default_servers;
    use shellpilot_application::ports::tool_executor::ToolExecutorPort;
    use tempfile::tempdir;

    fn registry_in(dir: &std::path::Path) -> ToolRegistry {
        let session = SessionHandle::new(ShellSession::new(dir));
        let pool = Arc::new(LspPool::new(default_servers(), session.clone()));
        builtin_registry(ToolContext::new(session, ToolSettings::default()), pool)
    }

    #[test]
    fn test_all_builtins_registered_in_order() {
        let dir = tempdir().unwrap();
        let registry = registry_in(dir.path());

        assert_eq!(
            registry.tool_names(),
            vec![
                "read_file",
                "write_file",
                "append_file",
                "list_dir",
                "grep",
                "find_files",
                "read_lines",
                "str_replace",
                "insert_lines",
                "execute_code",
                "run_command",
                "tree",
                "code_stats",
                "install_package",
                "code_intel",
            ]
        );
        let list = registry.tool_list();
        assert!(list.starts_with(r#"- read_file: Read file content. Params: {"path": "file.txt"}"#));
        assert_eq!(list.lines().count(), 15);
    }

    #[tokio::test]
    async fn test_write_then_read_through_registry() {
        let dir = tempdir().unwrap();
        let registry = registry_in(dir.path());

        let diff = registry
            .execute(
                &ToolCall::new(WRITE_FILE)
                    .with_arg("path", "notes/todo.txt")
                    .with_arg("content", "buy milk"),
            )
            .await
            .unwrap();
        assert!(diff.contains("[NEW]"));

        let content = registry
            .execute(&ToolCall::new(READ_FILE).with_arg("path", "notes/todo.txt"))
            .await
            .unwrap();
        assert_eq!(content, "buy milk");
    }

    #[tokio::test]
    async fn test_run_command_shares_session_dir() {
        let dir = tempdir().unwrap();
        let registry = registry_in(dir.path());
        std::fs::write(dir.path().join("marker"), "").unwrap();

        let out = registry
            .execute(&ToolCall::new(RUN_COMMAND).with_arg("command", "ls"))
            .await
            .unwrap();
        assert_eq!(out, "marker\n");
    }
}
