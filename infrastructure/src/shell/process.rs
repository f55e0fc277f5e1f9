//! Captured `bash -c` execution with a wall-clock bound and an output cap.

use super::session::ShellSession;
use shellpilot_domain::{CommandOutput, format_timeout};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

const SUCCESS_NO_OUTPUT: &str = "(command completed successfully)";

/// Bounds applied to every captured run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl CaptureLimits {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Run `command` under `bash -c` in the session's directory and environment.
///
/// Never fails: spawn errors, non-zero exits and timeouts all come back as
/// a [`CommandOutput`] whose text is ready for the model. `bash` leads its
/// own process group; on timeout or output overflow the whole group is
/// killed, so nothing it started outlives the call.
pub async fn run_captured(
    command: &str,
    session: &ShellSession,
    limits: CaptureLimits,
) -> CommandOutput {
    debug!(
        "Running captured: {} (cwd: {})",
        command,
        session.working_dir.display()
    );

    let mut cmd = Command::new("bash");
    cmd.arg("-c")
        .arg(command)
        .current_dir(&session.working_dir)
        .envs(&session.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return CommandOutput::failure(None, format!("Error (exit code unknown):\n{}", e));
        }
    };

    let cap = limits.max_output_bytes;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let run = async {
        let (out, err) = tokio::join!(read_capped(stdout, cap), read_capped(stderr, cap));
        if out.overflowed || err.overflowed {
            // Stop a runaway producer instead of letting it fill the pipe.
            kill_process_group(&mut child);
        }
        let status = child.wait().await;
        (status, out, err)
    };

    let outcome = tokio::time::timeout(limits.timeout, run).await;
    let (status, out, err) = match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Command timed out after {}, killing: {}",
                format_timeout(limits.timeout),
                command
            );
            kill_process_group(&mut child);
            let _ = child.wait().await;
            return CommandOutput::timed_out(limits.timeout);
        }
    };

    let truncated = out.overflowed || err.overflowed;
    let stdout_text = out.text(cap);
    let stderr_text = err.text(cap);

    match status {
        Ok(status) if status.success() => {
            let text = if stdout_text.is_empty() {
                SUCCESS_NO_OUTPUT.to_string()
            } else {
                stdout_text
            };
            CommandOutput::success(text).with_truncated(truncated)
        }
        Ok(status) => {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let detail = if !stderr_text.trim().is_empty() {
                stderr_text
            } else if !stdout_text.trim().is_empty() {
                stdout_text
            } else {
                "(no output)".to_string()
            };
            CommandOutput::failure(status.code(), format!("Error (exit code {}):\n{}", code, detail))
                .with_truncated(truncated)
        }
        Err(e) => CommandOutput::failure(None, format!("Error (exit code unknown):\n{}", e)),
    }
}

/// SIGKILL to every process in the child's group.
#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    if let Some(pid) = child.id() {
        // SAFETY: plain syscall on a pid we spawned as a group leader.
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc == 0 {
            return;
        }
        debug!(pid, "killpg failed, killing the leader only");
    }
    let _ = child.start_kill();
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.start_kill();
}

struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
}

impl Captured {
    fn text(&self, cap: usize) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.overflowed {
            text.push_str(&format!("\n... (output truncated at {} bytes)", cap));
        }
        text
    }
}

async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, cap: usize) -> Captured {
    let mut bytes = Vec::new();
    if let Some(reader) = reader {
        let _ = reader.take(cap as u64 + 1).read_to_end(&mut bytes).await;
    }
    let overflowed = bytes.len() > cap;
    bytes.truncate(cap);
    Captured { bytes, overflowed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session_in(dir: &std::path::Path) -> ShellSession {
        ShellSession::new(dir)
    }

    #[tokio::test]
    async fn captures_stdout() {
        let dir = tempdir().unwrap();
        let out = run_captured("echo hello", &session_in(dir.path()), CaptureLimits::default()).await;

        assert!(out.is_success());
        assert_eq!(out.text, "hello\n");
    }

    #[tokio::test]
    async fn empty_success_has_placeholder() {
        let dir = tempdir().unwrap();
        let out = run_captured("true", &session_in(dir.path()), CaptureLimits::default()).await;

        assert_eq!(out.text, "(command completed successfully)");
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let dir = tempdir().unwrap();
        let out = run_captured(
            "echo boom >&2; exit 3",
            &session_in(dir.path()),
            CaptureLimits::default(),
        )
        .await;

        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.text, "Error (exit code 3):\nboom\n");
    }

    #[tokio::test]
    async fn runs_in_session_directory_with_overlay_env() {
        let dir = tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.env.insert("SP_TEST_VAR".into(), "overlay".into());

        let out = run_captured("pwd -P; echo $SP_TEST_VAR", &session, CaptureLimits::default()).await;

        let cwd = dir.path().canonicalize().unwrap();
        assert_eq!(out.text, format!("{}\noverlay\n", cwd.display()));
    }

    #[tokio::test]
    async fn timeout_kills_command() {
        let dir = tempdir().unwrap();
        let limits = CaptureLimits::default().with_timeout(Duration::from_millis(200));

        let out = run_captured("sleep 5", &session_in(dir.path()), limits).await;

        assert!(out.timed_out);
        assert_eq!(out.text, "Error: command timed out after 200ms");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_background_children_too() {
        let dir = tempdir().unwrap();
        let limits = CaptureLimits::default().with_timeout(Duration::from_millis(500));

        // The compound command keeps bash alive as the parent of `sleep`.
        let out = run_captured(
            "sleep 31.4159 & echo $! > sleeper.pid; wait; echo never",
            &session_in(dir.path()),
            limits,
        )
        .await;
        assert!(out.timed_out);

        let pid = std::fs::read_to_string(dir.path().join("sleeper.pid")).unwrap();
        let stat = format!("/proc/{}/stat", pid.trim());
        // Gone, or a zombie waiting for whoever adopted it.
        let alive = || match std::fs::read_to_string(&stat) {
            Ok(line) => !line
                .rsplit_once(") ")
                .is_some_and(|(_, rest)| rest.starts_with('Z')),
            Err(_) => false,
        };
        let mut gone = false;
        for _ in 0..40 {
            if !alive() {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(gone, "background sleep {} survived the timeout", pid.trim());
    }

    #[tokio::test]
    async fn output_is_capped() {
        let dir = tempdir().unwrap();
        let limits = CaptureLimits {
            max_output_bytes: 8,
            ..CaptureLimits::default()
        };

        let out = run_captured("printf '0123456789abcdef'", &session_in(dir.path()), limits).await;

        assert!(out.truncated);
        assert!(out.text.contains("01234567\n... (output truncated at 8 bytes)"));
    }
}
