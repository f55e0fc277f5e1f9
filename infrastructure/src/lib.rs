//! Infrastructure layer for shellpilot
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the shell executor and its persisted session,
//! the tool registry with the built-in tools and language-server client,
//! the HTTP chat gateway, configuration file loading and the JSONL
//! conversation log.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod shell;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use gateway::{GatewaySettings, OpenAiCompatibleGateway};
pub use logging::JsonlConversationLogger;
pub use shell::{SessionHandle, SessionStore, SessionStoreError, ShellExecutor, ShellSession};
pub use tools::{
    LspError, LspPool, ToolContext, ToolRegistry, ToolSettings, builtin_registry,
};
