//! Run Shell Loop use case
//!
//! Shell-command mode: commands are pulled out of fenced `bash` blocks or
//! `bash` labels, the human picks what runs, and the output goes back as a
//! `[Command Results]` turn. There is no iteration cap; the human is the
//! brake.
//!
//! ```text
//! reply ─▶ extract_commands ─▶ none? ─────────────────▶ Converged
//!                 │
//!                 ▼
//!        y / auto / select / n ─── n, bad selection ──▶ Refused
//!                 │
//!                 ▼
//!     per command: dangerous? confirm ── all refused ─▶ Refused
//!                  interactive? hand over the terminal
//!                 │
//!                 ▼
//!         feedback turn ─▶ next reply
//! ```

use crate::config::LoopParams;
use crate::ports::agent_progress::{AgentProgressNotifier, NoAgentProgress};
use crate::ports::confirmation::{ConfirmationPort, ExecutionChoice};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::shell_executor::ShellExecutorPort;
use crate::use_cases::conversation::Conversation;
use crate::use_cases::run_agent::{AgentOutcome, RunAgentError};
use crate::use_cases::safety::confirm_dangerous;
use crate::use_cases::shared::{advance, terminate};
use serde_json::json;
use shellpilot_domain::agent::{COMMAND_RESULT_HEADER, COMMAND_RESULTS_HEADER};
use shellpilot_domain::{
    ActionRecord, CommandClass, CommandPolicy, IterationState, LoopPhase, TerminationReason,
    build_feedback, command_preview, extract_commands,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Use case for running the shell-command loop
pub struct RunShellLoopUseCase<S: ShellExecutorPort + 'static> {
    shell: Arc<S>,
    confirmation: Arc<dyn ConfirmationPort>,
    policy: CommandPolicy,
    params: LoopParams,
    logger: Arc<dyn ConversationLogger>,
}

impl<S: ShellExecutorPort + 'static> RunShellLoopUseCase<S> {
    pub fn new(
        shell: Arc<S>,
        confirmation: Arc<dyn ConfirmationPort>,
        policy: CommandPolicy,
        params: LoopParams,
    ) -> Self {
        Self {
            shell,
            confirmation,
            policy,
            params,
            logger: Arc::new(NoConversationLogger),
        }
    }

    /// Set a conversation logger for structured event logging.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
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
        info!(auto_execute = self.params.auto_execute, "Starting shell turn");

        let mut state = IterationState::new();
        let mut auto = self.params.auto_execute;

        advance(&mut state, LoopPhase::AwaitingModelReply, progress)?;
        let mut reply = conversation.send(request, true, progress).await?;

        loop {
            advance(&mut state, LoopPhase::ParsingResponse, progress)?;
            let commands = extract_commands(&reply);
            debug!(count = commands.len(), "extracted shell commands");

            if commands.is_empty() {
                return self.finish(&mut state, TerminationReason::Converged, reply, progress);
            }

            let choice = if auto {
                progress.on_auto_execute();
                ExecutionChoice::All
            } else {
                match self.confirmation.choose_execution(&commands).await {
                    Ok(choice) => choice,
                    Err(e) => {
                        warn!("Could not read execution choice, declining: {}", e);
                        ExecutionChoice::Decline
                    }
                }
            };

            let (selected, header): (Vec<&String>, &str) = match choice {
                ExecutionChoice::All => (commands.iter().collect(), COMMAND_RESULTS_HEADER),
                ExecutionChoice::Auto => {
                    auto = true;
                    (commands.iter().collect(), COMMAND_RESULTS_HEADER)
                }
                ExecutionChoice::Select(index) if index < commands.len() => {
                    (vec![&commands[index]], COMMAND_RESULT_HEADER)
                }
                ExecutionChoice::Select(index) => {
                    warn!(index, available = commands.len(), "Selection out of range");
                    return self.finish(&mut state, TerminationReason::Refused, reply, progress);
                }
                ExecutionChoice::Decline => {
                    return self.finish(&mut state, TerminationReason::Refused, reply, progress);
                }
            };

            advance(&mut state, LoopPhase::ExecutingActions, progress)?;
            let mut records = Vec::with_capacity(selected.len());
            for command in selected {
                records.push(self.run_command(command, progress).await);
            }
            state.complete_iteration();

            let Some(feedback) = build_feedback(header, &records) else {
                // Every command was a refused dangerous one.
                return self.finish(&mut state, TerminationReason::Refused, reply, progress);
            };

            advance(&mut state, LoopPhase::SendingFeedback, progress)?;
            progress.on_feedback_sent(records.iter().filter(|r| !r.is_skipped()).count());

            advance(&mut state, LoopPhase::AwaitingModelReply, progress)?;
            reply = conversation.send(&feedback, false, progress).await?;
        }
    }

    fn finish(
        &self,
        state: &mut IterationState,
        reason: TerminationReason,
        reply: String,
        progress: &dyn AgentProgressNotifier,
    ) -> Result<AgentOutcome, RunAgentError> {
        terminate(state, reason, reply, 0, progress, self.logger.as_ref())
    }

    async fn run_command(
        &self,
        command: &str,
        progress: &dyn AgentProgressNotifier,
    ) -> ActionRecord {
        let preview = command_preview(command);

        if self.policy.classify(command) == CommandClass::Dangerous
            && !confirm_dangerous(command, self.confirmation.as_ref()).await
        {
            info!(command = %preview, "Dangerous command skipped");
            progress.on_command_skipped(&preview);
            self.logger.log(ConversationEvent::new(
                "command_skipped",
                json!({ "command": command }),
            ));
            return ActionRecord::Skipped { preview };
        }

        let interactive = self.policy.is_interactive(command);
        progress.on_command_start(&preview, interactive);
        let output = if interactive {
            self.shell.execute_interactive(command).await
        } else {
            self.shell.execute(command).await
        };
        progress.on_command_result(&preview, &output);

        self.logger.log(ConversationEvent::new(
            "command_execution",
            json!({
                "command": command,
                "interactive": interactive,
                "exit_code": output.exit_code,
                "timed_out": output.timed_out,
                "truncated": output.truncated,
            }),
        ));

        ActionRecord::Command { preview, output }
    }
}
