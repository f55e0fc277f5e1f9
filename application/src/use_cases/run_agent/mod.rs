//! Run Agent use case
//!
//! Tool-call mode: the model asks for tools with `<tool>`/`<params>` blocks,
//! the registry runs them in order, and the results go back as a
//! `[Tool Results]` turn. Repeats until the model stops asking or the cap is
//! reached.
//!
//! | Reply contains        | Batches so far      | Result                      |
//! |-----------------------|---------------------|-----------------------------|
//! | no valid tool calls   | any                 | `Converged`                 |
//! | tool calls            | `< max_iterations`  | execute, feed back, repeat  |
//! | tool calls            | `== max_iterations` | `Capped` (not executed)     |
//!
//! Tools that run shell text (`run_command`, `install_package`) go through
//! the same dangerous-command gate as shell mode. A refusal becomes a
//! `REFUSED` tool error in the feedback and the rest of the batch runs.

mod types;

pub use types::{AgentOutcome, RunAgentError};

use crate::config::LoopParams;
use crate::ports::agent_progress::{AgentProgressNotifier, NoAgentProgress};
use crate::ports::confirmation::{AutoRejectConfirmation, ConfirmationPort};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::conversation::Conversation;
use crate::use_cases::safety::{confirm_dangerous, tool_shell_text};
use crate::use_cases::shared::{advance, terminate};
use serde_json::json;
use shellpilot_domain::agent::TOOL_RESULTS_HEADER;
use shellpilot_domain::{
    ActionRecord, CommandPolicy, IterationState, LoopPhase, TerminationReason, ToolCall,
    ToolCallScanner, ToolError, build_feedback, command_preview,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Use case for running the tool-call loop
pub struct RunAgentUseCase<T: ToolExecutorPort + 'static> {
    tool_executor: Arc<T>,
    params: LoopParams,
    policy: CommandPolicy,
    confirmation: Arc<dyn ConfirmationPort>,
    logger: Arc<dyn ConversationLogger>,
}

impl<T: ToolExecutorPort + 'static> Clone for RunAgentUseCase<T> {
    fn clone(&self) -> Self {
        Self {
            tool_executor: self.tool_executor.clone(),
            params: self.params.clone(),
            policy: self.policy.clone(),
            confirmation: self.confirmation.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<T: ToolExecutorPort + 'static> RunAgentUseCase<T> {
    /// Dangerous shell text is refused until a confirmation port is set
    /// with [`with_command_gate`](Self::with_command_gate).
    pub fn new(tool_executor: Arc<T>, params: LoopParams) -> Self {
        Self {
            tool_executor,
            params,
            policy: CommandPolicy::default(),
            confirmation: Arc::new(AutoRejectConfirmation),
            logger: Arc::new(NoConversationLogger),
        }
    }

    /// Classify shell-running tool calls with `policy` and ask
    /// `confirmation` before a dangerous one runs.
    pub fn with_command_gate(
        mut self,
        policy: CommandPolicy,
        confirmation: Arc<dyn ConfirmationPort>,
    ) -> Self {
        self.policy = policy;
        self.confirmation = confirmation;
        self
    }

    /// Set a conversation logger for structured event logging.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &LoopParams {
        &self.params
    }

    /// Run one user turn without progress reporting
    pub async fn execute(
        &self,
        conversation: &Conversation,
        request: &str,
    ) -> Result<AgentOutcome, RunAgentError> {
        self.execute_with_progress(conversation, request, &NoAgentProgress)
            .await
    }

    /// Run one user turn with progress callbacks
    pub async fn execute_with_progress(
        &self,
        conversation: &Conversation,
        request: &str,
        progress: &dyn AgentProgressNotifier,
    ) -> Result<AgentOutcome, RunAgentError> {
        info!(
            max_iterations = self.params.max_iterations,
            "Starting tool-call turn"
        );

        let mut state = IterationState::new();
        let mut repeated_action_warnings = 0;

        advance(&mut state, LoopPhase::AwaitingModelReply, progress)?;
        let mut reply = conversation.send(request, true, progress).await?;

        loop {
            advance(&mut state, LoopPhase::ParsingResponse, progress)?;
            let report = ToolCallScanner::new(&reply).scan();
            for failure in &report.failures {
                warn!("Dropped malformed tool call: {}", failure);
                progress.on_parse_failure(failure);
            }
            if report.recovered > 0 {
                debug!(recovered = report.recovered, "params recovered leniently");
            }

            if report.calls.is_empty() {
                return terminate(
                    &mut state,
                    TerminationReason::Converged,
                    reply,
                    repeated_action_warnings,
                    progress,
                    self.logger.as_ref(),
                );
            }

            if state.iterations() >= self.params.max_iterations {
                warn!(
                    max_iterations = self.params.max_iterations,
                    pending = report.calls.len(),
                    "Iteration cap reached with tool calls pending"
                );
                progress.on_iteration_cap(self.params.max_iterations);
                let iterations = state.iterations();
                return terminate(
                    &mut state,
                    TerminationReason::Capped { iterations },
                    reply,
                    repeated_action_warnings,
                    progress,
                    self.logger.as_ref(),
                );
            }

            let streak = state.record_batch(&report.calls);
            if self.params.repeat_threshold > 0 && streak == self.params.repeat_threshold {
                let tool = state.last_tool().unwrap_or_default().to_string();
                warn!(tool = %tool, streak, "Model is repeating the same tool call");
                progress.on_repeated_action(&tool, streak);
                repeated_action_warnings += 1;
            }

            advance(&mut state, LoopPhase::ExecutingActions, progress)?;
            let mut records = Vec::with_capacity(report.calls.len());
            for call in report.calls {
                records.push(self.run_tool(call, progress).await);
            }
            let iteration = state.complete_iteration();
            debug!(iteration, "batch executed");

            advance(&mut state, LoopPhase::SendingFeedback, progress)?;
            let feedback = build_feedback(TOOL_RESULTS_HEADER, &records)
                .unwrap_or_else(|| TOOL_RESULTS_HEADER.to_string());
            progress.on_feedback_sent(records.len());

            advance(&mut state, LoopPhase::AwaitingModelReply, progress)?;
            reply = conversation.send(&feedback, false, progress).await?;
        }
    }

    async fn run_tool(&self, call: ToolCall, progress: &dyn AgentProgressNotifier) -> ActionRecord {
        debug!("Dispatching {}", call.preview());
        progress.on_tool_call(&call);
        self.logger.log(ConversationEvent::new(
            "tool_call",
            json!({ "tool": call.tool_name, "arguments": call.arguments }),
        ));

        let outcome = match self.refusal(&call, progress).await {
            Some(refused) => Err(refused),
            None => self.tool_executor.execute(&call).await,
        };
        if let Err(e) = &outcome {
            warn!(tool = %call.tool_name, code = %e.code, "Tool failed: {}", e.message);
        }

        progress.on_tool_result(&call, &outcome);
        self.logger.log(ConversationEvent::new(
            "tool_result",
            match &outcome {
                Ok(output) => json!({
                    "tool": call.tool_name,
                    "success": true,
                    "bytes": output.len(),
                }),
                Err(e) => json!({
                    "tool": call.tool_name,
                    "success": false,
                    "code": e.code,
                    "message": e.message,
                }),
            },
        ));

        ActionRecord::Tool { call, outcome }
    }

    /// `Some` when the call would run dangerous shell text and the human
    /// said no.
    async fn refusal(
        &self,
        call: &ToolCall,
        progress: &dyn AgentProgressNotifier,
    ) -> Option<ToolError> {
        let text = tool_shell_text(call)?;
        if !self.policy.is_dangerous(&text)
            || confirm_dangerous(&text, self.confirmation.as_ref()).await
        {
            return None;
        }
        let preview = command_preview(&text);
        info!(tool = %call.tool_name, command = %preview, "Dangerous tool command refused");
        progress.on_command_skipped(&preview);
        self.logger.log(ConversationEvent::new(
            "command_skipped",
            json!({ "tool": call.tool_name, "command": text }),
        ));
        Some(ToolError::refused(preview))
    }
}
