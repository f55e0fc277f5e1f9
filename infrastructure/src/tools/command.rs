//! Command execution tool: run_command
//!
//! Runs through the same captured executor as shell mode, in the session's
//! working directory, so a `cd` from shell mode carries over.

use super::context::ToolContext;
use crate::shell::run_captured;
use shellpilot_domain::{CommandOutput, ToolCall, ToolError, format_timeout};
use std::time::Duration;

/// Tool name constant
pub const RUN_COMMAND: &str = "run_command";

/// Longest per-call timeout a model may ask for.
const MAX_TIMEOUT_SECS: i64 = 600;

/// Map a captured run onto a tool result. `what` names the action in the
/// error message.
pub(crate) fn into_tool_result(
    out: CommandOutput,
    timeout: Duration,
    what: &str,
) -> Result<String, ToolError> {
    if out.timed_out {
        return Err(ToolError::timeout(format!(
            "{} (killed after {})",
            what,
            format_timeout(timeout)
        )));
    }
    if out.is_success() {
        return Ok(out.text);
    }
    // Drop the `Error (exit code N):` header; the code is restated below.
    let detail = out
        .text
        .split_once('\n')
        .map(|(_, rest)| rest)
        .unwrap_or(&out.text);
    let code = out
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    Err(ToolError::execution_failed(format!(
        "{} failed with exit code {}:\n{}",
        what, code, detail
    )))
}

pub async fn run_command(ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
    let command = call
        .require_string("command")
        .map_err(ToolError::invalid_argument)?;
    let timeout = call
        .get_i64("timeout_secs")
        .filter(|t| *t > 0)
        .map(|t| Duration::from_secs(t.min(MAX_TIMEOUT_SECS) as u64));

    let limits = ctx.capture_limits(timeout);
    let out = run_captured(command, &ctx.session.snapshot(), limits).await;
    into_tool_result(out, limits.timeout, command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{SessionHandle, ShellSession};
    use crate::tools::context::ToolSettings;
    use shellpilot_domain::tool::value_objects::{EXECUTION_FAILED, INVALID_ARGUMENT, TIMEOUT};
    use tempfile::tempdir;

    fn ctx_in(dir: &std::path::Path) -> ToolContext {
        ToolContext::new(
            SessionHandle::new(ShellSession::new(dir)),
            ToolSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_run_command_in_session_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("here.txt"), "").unwrap();
        let ctx = ctx_in(dir.path());

        let out = run_command(&ctx, &ToolCall::new(RUN_COMMAND).with_arg("command", "ls"))
            .await
            .unwrap();

        assert_eq!(out, "here.txt\n");
    }

    #[tokio::test]
    async fn test_run_command_failure() {
        let dir = tempdir().unwrap();
        let ctx = ctx_in(dir.path());

        let err = run_command(
            &ctx,
            &ToolCall::new(RUN_COMMAND).with_arg("command", "echo bad >&2; exit 2"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, EXECUTION_FAILED);
        assert_eq!(
            err.message,
            "echo bad >&2; exit 2 failed with exit code 2:\nbad\n"
        );
    }

    #[tokio::test]
    async fn test_run_command_timeout() {
        let dir = tempdir().unwrap();
        let ctx = ctx_in(dir.path());

        let err = run_command(
            &ctx,
            &ToolCall::new(RUN_COMMAND)
                .with_arg("command", "sleep 10")
                .with_arg("timeout_secs", 1),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.contains("killed after 1s"));
    }

    #[tokio::test]
    async fn test_run_command_requires_command() {
        let dir = tempdir().unwrap();
        let err = run_command(&ctx_in(dir.path()), &ToolCall::new(RUN_COMMAND))
            .await
            .unwrap_err();

        assert_eq!(err.code, INVALID_ARGUMENT);
    }
}
