//! Transcript port.
//!
//! `tracing` carries diagnostics for humans. This port carries the run
//! itself (turns, tool calls, command runs, terminations) as records a
//! program can read back.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// One transcript record: a kind tag, when it happened, and a JSON payload.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// e.g. `user_message`, `tool_call`, `command_execution`
    pub event_type: &'static str,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl ConversationEvent {
    /// Stamped with the current time.
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Sink for [`ConversationEvent`]s. Writing never fails from the caller's
/// side; an adapter that cannot write drops the record.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Discards everything.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
