//! LLM gateway adapters.

pub mod openai;

pub use openai::{GatewaySettings, OpenAiCompatibleGateway, OpenAiSession};
