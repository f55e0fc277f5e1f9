//! Iteration controller state machine.
//!
//! ```text
//!          user turn
//!  Idle ───────────────▶ AwaitingModelReply ◀─────────────┐
//!   ▲                           │ reply                     │
//!   │                           ▼                           │
//!   ├── nothing to do / cap ─ ParsingResponse               │
//!   │                           │ actions                   │
//!   │                           ▼                           │
//!   └── refused ───────────── ExecutingActions              │
//!                               │ results                   │
//!                               ▼                           │
//!                           SendingFeedback ────────────────┘
//! ```
//!
//! [`IterationState`] is created per agent turn and dropped when the turn
//! ends. It is never persisted.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Idle,
    AwaitingModelReply,
    ParsingResponse,
    ExecutingActions,
    SendingFeedback,
}

impl LoopPhase {
    pub fn as_str(&self) -> &str {
        match self {
            LoopPhase::Idle => "idle",
            LoopPhase::AwaitingModelReply => "awaiting_model_reply",
            LoopPhase::ParsingResponse => "parsing_response",
            LoopPhase::ExecutingActions => "executing_actions",
            LoopPhase::SendingFeedback => "sending_feedback",
        }
    }

    pub fn can_transition_to(&self, next: LoopPhase) -> bool {
        use LoopPhase::*;
        matches!(
            (self, next),
            (Idle, AwaitingModelReply)
                | (AwaitingModelReply, ParsingResponse)
                | (ParsingResponse, ExecutingActions)
                | (ParsingResponse, Idle)
                | (ExecutingActions, SendingFeedback)
                | (ExecutingActions, Idle)
                | (SendingFeedback, AwaitingModelReply)
        )
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid loop transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: LoopPhase,
    pub to: LoopPhase,
}

/// Why a turn handed control back to the human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum TerminationReason {
    /// The model's last reply contained nothing to execute.
    Converged,
    /// The iteration cap was hit with actions still pending.
    Capped { iterations: usize },
    /// The human declined to run what the model proposed.
    Refused,
}

impl TerminationReason {
    pub fn as_str(&self) -> &str {
        match self {
            TerminationReason::Converged => "converged",
            TerminationReason::Capped { .. } => "capped",
            TerminationReason::Refused => "refused",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Capped { iterations } => {
                write!(f, "capped after {} iterations", iterations)
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Which protocol the loop extracts actions with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Fenced / labelled shell commands, no iteration cap.
    #[default]
    Shell,
    /// `<tool>` / `<params>` calls, bounded by the iteration cap.
    Agent,
}

impl LoopMode {
    pub fn as_str(&self) -> &str {
        match self {
            LoopMode::Shell => "shell",
            LoopMode::Agent => "agent",
        }
    }
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shell" | "chat" => Ok(LoopMode::Shell),
            "agent" | "tool" | "tools" => Ok(LoopMode::Agent),
            other => Err(format!("unknown mode '{}' (expected shell or agent)", other)),
        }
    }
}

/// Identity of a single-tool batch, for spotting a model that keeps
/// issuing the same call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActionSignature {
    tool_name: String,
    params: String,
}

impl ActionSignature {
    fn of(call: &ToolCall) -> Self {
        Self {
            tool_name: call.tool_name.clone(),
            params: serde_json::to_string(&call.arguments).unwrap_or_default(),
        }
    }
}

/// Per-turn state of the iteration controller.
#[derive(Debug, Clone)]
pub struct IterationState {
    phase: LoopPhase,
    iterations: usize,
    last_action: Option<ActionSignature>,
    repeat_streak: usize,
}

impl Default for IterationState {
    fn default() -> Self {
        Self::new()
    }
}

impl IterationState {
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::Idle,
            iterations: 0,
            last_action: None,
            repeat_streak: 0,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn advance(&mut self, next: LoopPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Number of action batches executed so far in this turn.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn complete_iteration(&mut self) -> usize {
        self.iterations += 1;
        self.iterations
    }

    /// Record the batch about to run and return the current repeat streak:
    /// how many consecutive batches were this exact single call. Batches of
    /// zero or several calls reset the streak.
    pub fn record_batch(&mut self, calls: &[ToolCall]) -> usize {
        match calls {
            [call] => {
                let signature = ActionSignature::of(call);
                if self.last_action.as_ref() == Some(&signature) {
                    self.repeat_streak += 1;
                } else {
                    self.repeat_streak = 1;
                }
                self.last_action = Some(signature);
            }
            _ => {
                self.last_action = None;
                self.repeat_streak = 0;
            }
        }
        self.repeat_streak
    }

    pub fn last_tool(&self) -> Option<&str> {
        self.last_action.as_ref().map(|a| a.tool_name.as_str())
    }

    /// Return to `Idle` from any phase, e.g. after a transport failure.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
