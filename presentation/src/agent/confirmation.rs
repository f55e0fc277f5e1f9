//! Console prompts for running shell commands.
//!
//! # User Interface
//!
//! For a batch of extracted commands:
//!
//! ```text
//! 💡 Found shell commands. Execute? (y/n/select/auto): s
//! 1. ls -la
//! 2. cat <<EOF...
//! Select command number: 2
//! ```
//!
//! For a command on the dangerous list:
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   ⚠️  DANGEROUS COMMAND DETECTED
//! ═══════════════════════════════════════════════════════════════
//!   rm -rf build/
//!
//! Are you sure? (yes/no):
//! ```
//!
//! | Answer | Aliases | Effect |
//! |--------|---------|--------|
//! | `y` | `yes` | Run every command |
//! | `auto` | | Run every command, stop asking for this turn |
//! | `select` | `s` | Pick one command by number |
//! | anything else | | Run nothing |

use async_trait::async_trait;
use colored::Colorize;
use shellpilot_application::{ConfirmationError, ConfirmationPort, ExecutionChoice};
use shellpilot_domain::command_preview;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Map an answer to `Execute? (y/n/select/auto)`. `None` means the human
/// asked to select and a number is still needed.
pub fn parse_execution_answer(answer: &str) -> Option<ExecutionChoice> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(ExecutionChoice::All),
        "auto" => Some(ExecutionChoice::Auto),
        "s" | "select" => None,
        _ => Some(ExecutionChoice::Decline),
    }
}

/// Parse a 1-based command number into an index into `count` commands.
pub fn parse_selection(answer: &str, count: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Only an explicit `yes` lets a dangerous command through.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Numbered listing shown for `select`.
pub fn numbered_previews(commands: &[String]) -> Vec<String> {
    commands
        .iter()
        .enumerate()
        .map(|(i, cmd)| format!("{}. {}", i + 1, command_preview(cmd)))
        .collect()
}

/// Terminal-based [`ConfirmationPort`].
///
/// Reads answers from stdin on a blocking thread so the runtime keeps
/// driving other tasks while it waits.
#[derive(Default)]
pub struct ConsoleConfirmation;

impl ConsoleConfirmation {
    pub fn new() -> Self {
        Self
    }

    async fn ask(prompt: String) -> Result<String, ConfirmationError> {
        tokio::task::spawn_blocking(move || -> io::Result<String> {
            print!("{}", prompt);
            io::stdout().flush()?;
            let mut line = String::new();
            if io::stdin().read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
            }
            Ok(line)
        })
        .await
        .map_err(|e| ConfirmationError::Io(e.to_string()))?
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted => {
                ConfirmationError::Cancelled
            }
            _ => ConfirmationError::Io(e.to_string()),
        })
    }

    fn display_danger_banner(command: &str) {
        println!();
        println!("{}", RULE.red().bold());
        println!("{}", "  ⚠️  DANGEROUS COMMAND DETECTED".red().bold());
        println!("{}", RULE.red().bold());
        for line in command.lines() {
            println!("  {}", line.yellow());
        }
        println!();
    }
}

#[async_trait]
impl ConfirmationPort for ConsoleConfirmation {
    async fn confirm_dangerous(&self, command: &str) -> Result<bool, ConfirmationError> {
        Self::display_danger_banner(command);
        let answer = Self::ask("Are you sure? (yes/no): ".to_string()).await?;
        Ok(is_affirmative(&answer))
    }

    async fn choose_execution(
        &self,
        commands: &[String],
    ) -> Result<ExecutionChoice, ConfirmationError> {
        let answer = Self::ask(format!(
            "\n💡 Found shell commands. {} ",
            "Execute? (y/n/select/auto):".cyan().bold()
        ))
        .await?;

        if let Some(choice) = parse_execution_answer(&answer) {
            return Ok(choice);
        }

        for line in numbered_previews(commands) {
            println!("{}", line);
        }
        let answer = Self::ask("Select command number: ".to_string()).await?;
        Ok(parse_selection(&answer, commands.len())
            .map(ExecutionChoice::Select)
            .unwrap_or(ExecutionChoice::Decline))
    }
}
