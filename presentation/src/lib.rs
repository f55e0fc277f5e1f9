//! Presentation layer for shellpilot
//!
//! This crate contains the CLI definition, the interactive REPL, console
//! prompts for running commands, progress reporting and output formatting.

pub mod agent;
pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use agent::{ConsoleConfirmation, ConsoleProgress};
pub use chat::{ChatRepl, ReplHost};
pub use cli::commands::{Cli, ModeArg};
pub use output::console::ConsoleFormatter;
