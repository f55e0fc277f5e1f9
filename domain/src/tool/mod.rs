//! Tool domain module
//!
//! Pure definitions for the agent's tool protocol: what a call looks like,
//! how it is recovered from model output, and how a failed call is reported.
//!
//! ```text
//! model text ──▶ ToolCallScanner ──▶ ToolCall ──▶ (registry) ──▶ String | ToolError
//!                    │
//!                    └─▶ ParseFailure (logged, dropped)
//! ```
//!
//! Execution itself lives behind the application layer's `ToolExecutorPort`;
//! nothing here performs I/O.

pub mod entities;
pub mod parser;
pub mod value_objects;

pub use entities::{ToolCall, ToolParams};
pub use parser::{ParseFailure, ScanReport, ToolCallScanner, parse_tool_calls};
pub use value_objects::ToolError;
