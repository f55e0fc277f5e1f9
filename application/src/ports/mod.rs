//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod agent_progress;
pub mod confirmation;
pub mod context_provider;
pub mod conversation_logger;
pub mod llm_gateway;
pub mod shell_executor;
pub mod tool_executor;
