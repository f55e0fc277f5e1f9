//! Prompt domain
//!
//! Text the loop sends to the model besides the user's own words.

pub mod agent;
pub mod context;

pub use agent::AgentPromptTemplate;
pub use context::SystemContext;
