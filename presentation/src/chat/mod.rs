//! Interactive chat module
//!
//! The readline REPL with its host commands, and the one-shot stdin mode.

mod repl;
pub mod stdin;

pub use repl::{ChatRepl, HostCommand, ReplHost, parse_host_command};
