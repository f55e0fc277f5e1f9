//! Shared utilities for the loop use cases.
//!
//! Phase transitions and termination bookkeeping used by both RunAgent and
//! RunShellLoop.

use crate::ports::agent_progress::AgentProgressNotifier;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::use_cases::run_agent::{AgentOutcome, RunAgentError};
use serde_json::json;
use shellpilot_domain::{IterationState, LoopPhase, TerminationReason};
use tracing::{debug, info};

/// Move the state machine and tell the notifier.
pub(crate) fn advance(
    state: &mut IterationState,
    next: LoopPhase,
    progress: &dyn AgentProgressNotifier,
) -> Result<(), RunAgentError> {
    state.advance(next)?;
    debug!(phase = %next, iteration = state.iterations(), "loop phase");
    progress.on_phase_change(next);
    Ok(())
}

/// Return to `Idle` and build the outcome for `reason`.
pub(crate) fn terminate(
    state: &mut IterationState,
    reason: TerminationReason,
    final_response: String,
    repeated_action_warnings: usize,
    progress: &dyn AgentProgressNotifier,
    logger: &dyn ConversationLogger,
) -> Result<AgentOutcome, RunAgentError> {
    advance(state, LoopPhase::Idle, progress)?;
    let iterations = state.iterations();

    info!(reason = %reason, iterations, "turn finished");
    progress.on_termination(&reason, iterations);
    logger.log(ConversationEvent::new(
        "loop_terminated",
        json!({
            "reason": reason.as_str(),
            "iterations": iterations,
            "repeated_action_warnings": repeated_action_warnings,
        }),
    ));

    Ok(AgentOutcome {
        reason,
        iterations,
        final_response,
        repeated_action_warnings,
    })
}
