//! Type definitions shared by the agent loops.

use crate::ports::llm_gateway::GatewayError;
use shellpilot_domain::{InvalidTransition, TerminationReason};
use thiserror::Error;

/// Errors that end a turn abnormally.
///
/// Tool failures, parse failures and refusals are not errors: they are fed
/// back to the model or reported through [`AgentOutcome::reason`].
#[derive(Error, Debug)]
pub enum RunAgentError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Loop state error: {0}")]
    InvalidState(#[from] InvalidTransition),
}

impl RunAgentError {
    /// Whether the transport to the model failed (as opposed to a bug).
    pub fn is_transport(&self) -> bool {
        matches!(self, RunAgentError::GatewayError(_))
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    pub reason: TerminationReason,
    /// Action batches executed during the turn.
    pub iterations: usize,
    /// The last model reply.
    pub final_response: String,
    /// How many times the repeated-action heuristic fired.
    pub repeated_action_warnings: usize,
}
