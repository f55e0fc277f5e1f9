//! Confirmation port for asking the human before commands run.
//!
//! # Architecture
//!
//! - **Port**: [`ConfirmationPort`] - defined here in application layer
//! - **Adapter**: `ConsoleConfirmation` - implemented in presentation layer
//!
//! # Flow
//!
//! ```text
//! reply has commands
//!        ↓
//! choose_execution()      y / n / select / auto
//!        ↓
//! for each command:
//!   dangerous? → confirm_dangerous()   yes / anything else
//!        ↓
//! execute
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveConfirmation`] - runs everything
//! - [`AutoRejectConfirmation`] - runs nothing

use async_trait::async_trait;
use thiserror::Error;

/// Failures while asking, not decisions made by the user.
#[derive(Debug, Clone, Error)]
pub enum ConfirmationError {
    /// User cancelled the prompt (e.g., via Ctrl+C).
    #[error("Operation cancelled")]
    Cancelled,
    /// Terminal read failure.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Answer to "Execute? (y/n/select/auto)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionChoice {
    /// Run every command in the batch.
    All,
    /// Run every command, and stop asking for the rest of the turn.
    Auto,
    /// Run only the command at this 0-based index.
    Select(usize),
    /// Run nothing; the turn ends.
    Decline,
}

#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    /// Ask whether a dangerous command may run. Only an explicit yes
    /// returns `true`.
    async fn confirm_dangerous(&self, command: &str) -> Result<bool, ConfirmationError>;

    /// Ask how to run a batch of extracted commands.
    async fn choose_execution(
        &self,
        commands: &[String],
    ) -> Result<ExecutionChoice, ConfirmationError>;
}

/// Approves everything, dangerous commands included.
pub struct AutoApproveConfirmation;

#[async_trait]
impl ConfirmationPort for AutoApproveConfirmation {
    async fn confirm_dangerous(&self, _command: &str) -> Result<bool, ConfirmationError> {
        Ok(true)
    }

    async fn choose_execution(
        &self,
        _commands: &[String],
    ) -> Result<ExecutionChoice, ConfirmationError> {
        Ok(ExecutionChoice::All)
    }
}

/// Declines everything.
pub struct AutoRejectConfirmation;

#[async_trait]
impl ConfirmationPort for AutoRejectConfirmation {
    async fn confirm_dangerous(&self, _command: &str) -> Result<bool, ConfirmationError> {
        Ok(false)
    }

    async fn choose_execution(
        &self,
        _commands: &[String],
    ) -> Result<ExecutionChoice, ConfirmationError> {
        Ok(ExecutionChoice::Decline)
    }
}
