//! Shell executor port
//!
//! How the shell-command loop runs what the model proposed.

use async_trait::async_trait;
use shellpilot_domain::CommandOutput;

#[async_trait]
pub trait ShellExecutorPort: Send + Sync {
    /// Run with captured output, a wall-clock timeout and an output cap.
    async fn execute(&self, command: &str) -> CommandOutput;

    /// Hand the terminal to the command until it exits.
    async fn execute_interactive(&self, command: &str) -> CommandOutput;
}
