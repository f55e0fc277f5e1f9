//! Application layer for shellpilot
//!
//! This crate contains the agent loops, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::LoopParams;
pub use ports::{
    agent_progress::{AgentProgressNotifier, NoAgentProgress},
    confirmation::{
        AutoApproveConfirmation, AutoRejectConfirmation, ConfirmationError, ConfirmationPort,
        ExecutionChoice,
    },
    context_provider::{StaticContext, SystemContextProvider},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession, StreamHandle},
    shell_executor::ShellExecutorPort,
    tool_executor::ToolExecutorPort,
};
pub use use_cases::conversation::Conversation;
pub use use_cases::run_agent::{AgentOutcome, RunAgentError, RunAgentUseCase};
pub use use_cases::run_shell_loop::RunShellLoopUseCase;
pub use use_cases::safety::confirm_dangerous;
