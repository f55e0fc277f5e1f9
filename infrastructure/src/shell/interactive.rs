//! Terminal hand-off for editors, REPLs, pagers and remote shells.
//!
//! The child gets its own pseudoterminal. While it runs, our terminal is in
//! raw mode and every byte is passed through both ways, so keys like Ctrl+C
//! reach the child's line discipline instead of signalling shellpilot.

use super::session::ShellSession;
use crossterm::{cursor, execute, terminal};
use portable_pty::{ChildKiller, CommandBuilder, PtySize, native_pty_system};
use shellpilot_domain::CommandOutput;
use std::io::{IsTerminal, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub const INTERACTIVE_COMPLETED: &str = "(interactive session completed)";

/// How long the output pump may keep draining after the child exits.
/// Background jobs that still hold the pty are left to the pump thread.
const OUTPUT_DRAIN: Duration = Duration::from_millis(500);

/// How often the input pump checks whether the child is gone.
#[cfg(unix)]
const INPUT_POLL_MS: i32 = 100;

/// Puts the terminal in raw mode for a child process and restores the
/// previous mode on drop, whichever way the child run ends.
pub struct TerminalGuard {
    was_raw: bool,
}

impl TerminalGuard {
    pub fn acquire() -> Self {
        let was_raw = terminal::is_raw_mode_enabled().unwrap_or(false);
        if !was_raw
            && std::io::stdin().is_terminal()
            && let Err(e) = terminal::enable_raw_mode()
        {
            warn!("Could not enter raw mode for interactive command: {}", e);
        }
        Self { was_raw }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.was_raw
            && terminal::is_raw_mode_enabled().unwrap_or(false)
            && let Err(e) = terminal::disable_raw_mode()
        {
            warn!("Could not restore terminal mode: {}", e);
        }
        // Full-screen programs that crash can leave the cursor hidden.
        let _ = execute!(std::io::stdout(), cursor::Show);
    }
}

/// Run `command` on a fresh pseudoterminal wired to ours until it exits.
pub async fn run_interactive(command: &str, session: &ShellSession) -> CommandOutput {
    debug!("Running interactive: {}", command);
    if !session.working_dir.is_dir() {
        return spawn_failure(format!(
            "working directory not found: {}",
            session.working_dir.display()
        ));
    }

    let pair = match native_pty_system().openpty(pty_size()) {
        Ok(pair) => pair,
        Err(e) => return spawn_failure(e.to_string()),
    };
    let mut child = match pair.slave.spawn_command(shell_command(command, session)) {
        Ok(child) => child,
        Err(e) => return spawn_failure(e.to_string()),
    };
    drop(pair.slave);

    let (reader, writer) = match (pair.master.try_clone_reader(), pair.master.take_writer()) {
        (Ok(reader), Ok(writer)) => (reader, writer),
        (Err(e), _) | (_, Err(e)) => {
            let _ = child.kill();
            let _ = child.wait();
            return spawn_failure(e.to_string());
        }
    };

    let _guard = TerminalGuard::acquire();
    let stop = Arc::new(AtomicBool::new(false));
    let input = forward_input(writer, stop.clone());
    let output = tokio::task::spawn_blocking(move || forward_output(reader));

    let status = tokio::task::spawn_blocking(move || child.wait()).await;

    stop.store(true, Ordering::SeqCst);
    if tokio::time::timeout(OUTPUT_DRAIN, output).await.is_err() {
        debug!("Interactive output still open after exit; leaving it to drain");
    }
    if input.join().is_err() {
        warn!("Interactive input pump panicked");
    }
    drop(pair.master);

    match status {
        Ok(Ok(status)) if status.success() => CommandOutput::success(INTERACTIVE_COMPLETED),
        Ok(Ok(status)) => {
            let code = status.exit_code() as i32;
            CommandOutput::failure(
                Some(code),
                format!("Error (exit code {}): interactive session ended", code),
            )
        }
        Ok(Err(e)) => CommandOutput::failure(
            None,
            format!("Error: interactive session lost: {}", e),
        ),
        Err(e) => CommandOutput::failure(
            None,
            format!("Error: interactive session lost: {}", e),
        ),
    }
}

fn spawn_failure(reason: String) -> CommandOutput {
    CommandOutput::failure(
        None,
        format!("Error: could not start interactive session: {}", reason),
    )
}

fn pty_size() -> PtySize {
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    PtySize {
        rows: rows.max(1),
        cols: cols.max(1),
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn shell_command(command: &str, session: &ShellSession) -> CommandBuilder {
    let mut cmd = CommandBuilder::new("bash");
    cmd.args(["-c", command]);
    cmd.cwd(&session.working_dir);
    for (key, value) in std::env::vars() {
        cmd.env(key, value);
    }
    for (key, value) in &session.env {
        cmd.env(key, value);
    }
    if cmd.get_env("TERM").is_none() {
        cmd.env("TERM", "xterm-256color");
    }
    cmd
}

fn forward_output(mut reader: Box<dyn Read + Send>) {
    let mut stdout = std::io::stdout();
    let mut buffer = [0u8; 8192];
    // EIO once the last slave handle closes.
    while let Ok(read) = reader.read(&mut buffer) {
        if read == 0 {
            break;
        }
        if stdout.write_all(&buffer[..read]).is_err() {
            break;
        }
        let _ = stdout.flush();
    }
}

/// Copy our stdin into the pty until `stop` is set or stdin closes.
///
/// A plain blocking read would outlive the child and swallow the next
/// keystroke meant for the prompt, so stdin is polled with a short timeout.
#[cfg(unix)]
fn forward_input(
    mut writer: Box<dyn Write + Send>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        while !stop.load(Ordering::SeqCst) {
            let mut fd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            // SAFETY: one valid pollfd for the duration of the call.
            let ready = unsafe { libc::poll(&mut fd, 1, INPUT_POLL_MS) };
            if ready < 0 {
                if std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                break;
            }
            if ready == 0 {
                continue;
            }
            // SAFETY: reads into a buffer we own, bounded by its length.
            let read = unsafe {
                libc::read(
                    libc::STDIN_FILENO,
                    buffer.as_mut_ptr().cast(),
                    buffer.len(),
                )
            };
            if read <= 0 {
                break;
            }
            if writer.write_all(&buffer[..read as usize]).is_err() {
                break;
            }
            let _ = writer.flush();
        }
    })
}

#[cfg(not(unix))]
fn forward_input(
    mut writer: Box<dyn Write + Send>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut buffer = [0u8; 4096];
        while !stop.load(Ordering::SeqCst) {
            match stdin.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    if writer.write_all(&buffer[..read]).is_err() {
                        break;
                    }
                    let _ = writer.flush();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn clean_exit_reports_completion() {
        let dir = tempdir().unwrap();
        let out = run_interactive("true", &ShellSession::new(dir.path())).await;

        assert!(out.is_success());
        assert_eq!(out.text, INTERACTIVE_COMPLETED);
    }

    #[tokio::test]
    async fn failing_exit_reports_code() {
        let dir = tempdir().unwrap();
        let out = run_interactive("exit 4", &ShellSession::new(dir.path())).await;

        assert_eq!(out.exit_code, Some(4));
        assert_eq!(out.text, "Error (exit code 4): interactive session ended");
    }

    #[tokio::test]
    async fn missing_directory_is_a_spawn_error() {
        let out = run_interactive("true", &ShellSession::new("/definitely/not/here")).await;

        assert!(!out.is_success());
        assert!(out.text.starts_with("Error: could not start interactive session: "));
    }

    #[tokio::test]
    async fn child_sees_a_terminal() {
        let dir = tempdir().unwrap();
        let out = run_interactive(
            "test -t 0 && test -t 1 && test -t 2",
            &ShellSession::new(dir.path()),
        )
        .await;

        assert!(out.is_success(), "{}", out.text);
    }

    #[tokio::test]
    async fn child_runs_in_session_directory_with_overlay_env() {
        let dir = tempdir().unwrap();
        let mut session = ShellSession::new(dir.path());
        session.env.insert("SHELLPILOT_MARK".into(), "42".into());

        let out = run_interactive(
            "test \"$SHELLPILOT_MARK\" = 42 && touch here.txt",
            &session,
        )
        .await;

        assert!(out.is_success(), "{}", out.text);
        assert!(dir.path().join("here.txt").exists());
    }

    #[test]
    fn guard_leaves_a_cooked_terminal_cooked() {
        let before = terminal::is_raw_mode_enabled().unwrap_or(false);
        drop(TerminalGuard::acquire());
        assert_eq!(terminal::is_raw_mode_enabled().unwrap_or(false), before);
    }
}
