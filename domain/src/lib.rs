//! Domain layer for shellpilot
//!
//! Pure logic with no I/O: turning model replies into actions, judging
//! shell commands, diffing file edits and tracking the agent loop.
//!
//! # Core Concepts
//!
//! ## Actions
//!
//! A model reply may carry two kinds of actions:
//!
//! - **Tool calls**: `<tool>name</tool><params>{...}</params>` blocks, parsed
//!   leniently by [`tool::parser`]
//! - **Shell commands**: fenced `bash` blocks or `bash` labels, pulled out by
//!   [`command::extractor`]
//!
//! ## The loop
//!
//! Actions run, their results go back to the model as a feedback turn, and
//! the cycle repeats until the model stops asking for actions, the human
//! refuses, or the iteration cap is hit ([`agent::state`]).

pub mod agent;
pub mod command;
pub mod diff;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

pub use agent::{
    ActionRecord, InvalidTransition, IterationState, LoopMode, LoopPhase, TerminationReason,
    build_feedback,
};
pub use command::{
    CommandClass, CommandOutput, CommandPolicy, command_preview, extract_commands, format_timeout,
};
pub use diff::{DiffEntry, DiffKind, compute_diff, format_change, render_create, render_diff};
pub use prompt::{AgentPromptTemplate, SystemContext};
pub use session::{Message, Role, Session, StreamEvent};
pub use tool::{
    ParseFailure, ScanReport, ToolCall, ToolCallScanner, ToolError, ToolParams, parse_tool_calls,
};
