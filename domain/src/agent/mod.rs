//! Agent loop domain module
//!
//! State machine, termination reasons and feedback formatting shared by the
//! tool-call and shell-command loops.

pub mod feedback;
pub mod state;

pub use feedback::{
    ActionRecord, COMMAND_RESULT_HEADER, COMMAND_RESULTS_HEADER, TOOL_RESULTS_HEADER,
    build_feedback,
};
pub use state::{InvalidTransition, IterationState, LoopMode, LoopPhase, TerminationReason};
