//! Scripted collaborators shared by the use case tests.

use crate::ports::agent_progress::AgentProgressNotifier;
use crate::ports::confirmation::{ConfirmationError, ConfirmationPort, ExecutionChoice};
use crate::ports::context_provider::{StaticContext, SystemContextProvider};
use crate::ports::llm_gateway::{GatewayError, LlmSession, StreamHandle};
use crate::ports::shell_executor::ShellExecutorPort;
use crate::ports::tool_executor::ToolExecutorPort;
use async_trait::async_trait;
use shellpilot_domain::{
    CommandOutput, LoopPhase, ParseFailure, SystemContext, TerminationReason, ToolCall, ToolError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub(crate) fn test_context() -> Arc<dyn SystemContextProvider> {
    Arc::new(StaticContext(SystemContext::new("linux", "tester", "/work")))
}

// ==================== Session ====================

enum Reply {
    Text(String),
    Fail(String),
}

/// Replies from a queue, recording every message it was sent.
pub(crate) struct ScriptedSession {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Option<String>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    pub(crate) fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Reply::Text(r.into())).collect()),
            fallback: None,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers every message with the same reply.
    pub(crate) fn repeating(reply: &str) -> Self {
        Self {
            fallback: Some(reply.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        let session = Self::new(Vec::new());
        session
            .replies
            .lock()
            .unwrap()
            .push_back(Reply::Fail(message.to_string()));
        session
    }

    /// Queue a transport failure after the scripted replies.
    pub(crate) fn then_fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Fail(message.to_string()));
        self
    }

    pub(crate) fn sent(&self) -> Arc<Mutex<Vec<String>>> {
        self.sent.clone()
    }

    fn next(&self, content: &str) -> Reply {
        self.sent.lock().unwrap().push(content.to_string());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Reply::Text(
                self.fallback
                    .clone()
                    .unwrap_or_else(|| "(no more responses)".to_string()),
            )
        })
    }
}

#[async_trait]
impl LlmSession for ScriptedSession {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        match self.next(content) {
            Reply::Text(t) => Ok(t),
            Reply::Fail(e) => Err(GatewayError::RequestFailed(e)),
        }
    }

    /// Streams each reply as two deltas so chunk forwarding is exercised.
    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        let reply = self.next(content);
        let (tx, rx) = mpsc::channel(4);
        match reply {
            Reply::Text(text) => {
                let mid = text
                    .char_indices()
                    .nth(text.chars().count() / 2)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                for part in [&text[..mid], &text[mid..]] {
                    if !part.is_empty() {
                        let _ = tx.send(shellpilot_domain::StreamEvent::Delta(part.into())).await;
                    }
                }
                let _ = tx.send(shellpilot_domain::StreamEvent::Completed(text)).await;
            }
            Reply::Fail(e) => {
                let _ = tx.send(shellpilot_domain::StreamEvent::Error(e)).await;
            }
        }
        Ok(StreamHandle::new(rx))
    }
}

// ==================== Tools ====================

/// Tiny in-memory tool set: `write_file`, `read_file`, `echo` and a
/// `run_command` that only reports what it would have run.
#[derive(Default)]
pub(crate) struct RecordingToolExecutor {
    files: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<ToolCall>>,
}

impl RecordingToolExecutor {
    pub(crate) fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl ToolExecutorPort for RecordingToolExecutor {
    fn tool_list(&self) -> String {
        "- read_file: Read a file\n- write_file: Write a file\n- echo: Echo text\n\
         - run_command: Run a shell command"
            .to_string()
    }

    fn has_tool(&self, name: &str) -> bool {
        matches!(name, "read_file" | "write_file" | "echo" | "run_command")
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(call.clone());
        match call.tool_name.as_str() {
            "write_file" => {
                let path = call.require_string("path").map_err(ToolError::invalid_argument)?;
                let content = call.get_string("content").unwrap_or_default();
                self.files
                    .lock()
                    .unwrap()
                    .insert(path.to_string(), content.to_string());
                Ok(format!("Wrote {} bytes to {}", content.len(), path))
            }
            "read_file" => {
                let path = call.require_string("path").map_err(ToolError::invalid_argument)?;
                self.file(path).ok_or_else(|| ToolError::not_found(path))
            }
            "echo" => Ok(call.get_string("text").unwrap_or_default().to_string()),
            "run_command" => {
                let command = call
                    .require_string("command")
                    .map_err(ToolError::invalid_argument)?;
                Ok(format!("ran {}", command))
            }
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

// ==================== Shell ====================

#[derive(Default)]
pub(crate) struct RecordingShellExecutor {
    outputs: HashMap<String, CommandOutput>,
    runs: Mutex<Vec<(String, bool)>>,
}

impl RecordingShellExecutor {
    pub(crate) fn with_output(mut self, command: &str, output: CommandOutput) -> Self {
        self.outputs.insert(command.to_string(), output);
        self
    }

    /// `(command, interactive)` in execution order.
    pub(crate) fn runs(&self) -> Vec<(String, bool)> {
        self.runs.lock().unwrap().clone()
    }

    fn run(&self, command: &str, interactive: bool) -> CommandOutput {
        self.runs
            .lock()
            .unwrap()
            .push((command.to_string(), interactive));
        self.outputs
            .get(command)
            .cloned()
            .unwrap_or_else(|| CommandOutput::success(format!("output of {}", command)))
    }
}

#[async_trait]
impl ShellExecutorPort for RecordingShellExecutor {
    async fn execute(&self, command: &str) -> CommandOutput {
        self.run(command, false)
    }

    async fn execute_interactive(&self, command: &str) -> CommandOutput {
        self.run(command, true);
        CommandOutput::success("(interactive session completed)")
    }
}

// ==================== Confirmation ====================

/// Answers from queues. An exhausted queue declines.
#[derive(Default)]
pub(crate) struct ScriptedConfirmation {
    choices: Mutex<VecDeque<Result<ExecutionChoice, ConfirmationError>>>,
    dangerous: Mutex<VecDeque<Result<bool, ConfirmationError>>>,
    choice_prompts: Mutex<Vec<Vec<String>>>,
    dangerous_prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmation {
    pub(crate) fn choose(self, choice: ExecutionChoice) -> Self {
        self.choices.lock().unwrap().push_back(Ok(choice));
        self
    }

    pub(crate) fn choose_err(self, err: ConfirmationError) -> Self {
        self.choices.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn dangerous(self, answer: bool) -> Self {
        self.dangerous.lock().unwrap().push_back(Ok(answer));
        self
    }

    pub(crate) fn dangerous_err(self, err: ConfirmationError) -> Self {
        self.dangerous.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn choice_prompts(&self) -> Vec<Vec<String>> {
        self.choice_prompts.lock().unwrap().clone()
    }

    pub(crate) fn dangerous_prompts(&self) -> Vec<String> {
        self.dangerous_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmationPort for ScriptedConfirmation {
    async fn confirm_dangerous(&self, command: &str) -> Result<bool, ConfirmationError> {
        self.dangerous_prompts
            .lock()
            .unwrap()
            .push(command.to_string());
        self.dangerous.lock().unwrap().pop_front().unwrap_or(Ok(false))
    }

    async fn choose_execution(
        &self,
        commands: &[String],
    ) -> Result<ExecutionChoice, ConfirmationError> {
        self.choice_prompts.lock().unwrap().push(commands.to_vec());
        self.choices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ExecutionChoice::Decline))
    }
}

// ==================== Progress ====================

#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<String>>,
    chunks: Mutex<String>,
}

impl RecordingProgress {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Number of events starting with `prefix`.
    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub(crate) fn chunks(&self) -> String {
        self.chunks.lock().unwrap().clone()
    }
}

impl AgentProgressNotifier for RecordingProgress {
    fn on_phase_change(&self, phase: LoopPhase) {
        self.push(format!("phase:{}", phase));
    }

    fn on_termination(&self, reason: &TerminationReason, iterations: usize) {
        self.push(format!("termination:{}:{}", reason.as_str(), iterations));
    }

    fn on_llm_stream_start(&self) {
        self.push("stream_start".into());
    }

    fn on_llm_chunk(&self, chunk: &str) {
        self.chunks.lock().unwrap().push_str(chunk);
    }

    fn on_llm_stream_end(&self) {
        self.push("stream_end".into());
    }

    fn on_parse_failure(&self, failure: &ParseFailure) {
        self.push(format!("parse_failure:{}", failure));
    }

    fn on_tool_call(&self, call: &ToolCall) {
        self.push(format!("tool_call:{}", call.tool_name));
    }

    fn on_tool_result(&self, call: &ToolCall, result: &Result<String, ToolError>) {
        let status = if result.is_ok() { "ok" } else { "err" };
        self.push(format!("tool_result:{}:{}", call.tool_name, status));
    }

    fn on_auto_execute(&self) {
        self.push("auto_execute".into());
    }

    fn on_command_start(&self, preview: &str, interactive: bool) {
        self.push(format!("command_start:{}:{}", preview, interactive));
    }

    fn on_command_result(&self, preview: &str, _output: &CommandOutput) {
        self.push(format!("command_result:{}", preview));
    }

    fn on_command_skipped(&self, preview: &str) {
        self.push(format!("command_skipped:{}", preview));
    }

    fn on_iteration_cap(&self, max_iterations: usize) {
        self.push(format!("iteration_cap:{}", max_iterations));
    }

    fn on_repeated_action(&self, tool_name: &str, streak: usize) {
        self.push(format!("repeated_action:{}:{}", tool_name, streak));
    }

    fn on_feedback_sent(&self, entries: usize) {
        self.push(format!("feedback_sent:{}", entries));
    }
}
