//! Agent loop progress port.
//!
//! [`AgentProgressNotifier`] is an **output port** that the presentation layer
//! implements to show what the loop is doing. All callback argument types
//! come from the domain layer.
//!
//! # Callback Categories
//!
//! - **Phase callbacks**: state machine transitions and termination
//! - **Streaming callbacks**: model reply chunks
//! - **Tool callbacks**: tool calls, results, parse failures
//! - **Command callbacks**: shell command start, result, skip
//! - **Loop guards**: iteration cap, repeated actions

use shellpilot_domain::{
    CommandOutput, LoopPhase, ParseFailure, TerminationReason, ToolCall, ToolError,
};

/// Progress notifier for the agent loops.
///
/// All methods have default no-op implementations, so implementers only
/// need to override the callbacks they care about.
pub trait AgentProgressNotifier: Send + Sync {
    /// Called when the loop transitions to a new phase
    fn on_phase_change(&self, _phase: LoopPhase) {}

    /// Called once when the turn hands control back to the human
    fn on_termination(&self, _reason: &TerminationReason, _iterations: usize) {}

    // ==================== LLM Streaming Callbacks ====================

    /// Called when LLM streaming begins.
    fn on_llm_stream_start(&self) {}

    /// Called for each text chunk received during LLM streaming.
    fn on_llm_chunk(&self, _chunk: &str) {}

    /// Called when LLM streaming ends.
    fn on_llm_stream_end(&self) {}

    // ==================== Tool Callbacks ====================

    /// Called for each malformed tool block that was dropped
    fn on_parse_failure(&self, _failure: &ParseFailure) {}

    /// Called when a tool is invoked
    fn on_tool_call(&self, _call: &ToolCall) {}

    /// Called when a tool returns
    fn on_tool_result(&self, _call: &ToolCall, _result: &Result<String, ToolError>) {}

    // ==================== Command Callbacks ====================

    /// Called when commands run without asking
    fn on_auto_execute(&self) {}

    /// Called before a shell command runs
    fn on_command_start(&self, _preview: &str, _interactive: bool) {}

    /// Called when a shell command finishes
    fn on_command_result(&self, _preview: &str, _output: &CommandOutput) {}

    /// Called when the human declines a dangerous command
    fn on_command_skipped(&self, _preview: &str) {}

    // ==================== Loop Guards ====================

    /// Called once when the loop stops at the iteration cap
    fn on_iteration_cap(&self, _max_iterations: usize) {}

    /// Called when the same single tool call repeats `streak` times in a row
    fn on_repeated_action(&self, _tool_name: &str, _streak: usize) {}

    /// Called after action results are sent back to the model
    fn on_feedback_sent(&self, _entries: usize) {}
}

/// No-op implementation for when progress isn't needed
pub struct NoAgentProgress;

impl AgentProgressNotifier for NoAgentProgress {}
