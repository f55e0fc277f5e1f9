//! Model endpoint configuration from TOML (`[model]` section)

use crate::gateway::GatewaySettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw model configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// OpenAI-compatible API root, without `/chat/completions`
    pub base_url: String,
    /// Model identifier sent with every request
    pub name: String,
    /// Environment variable holding the bearer key
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    /// Characters per streamed delta
    pub stream_chunk_size: usize,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            name: "arcee-ai/trinity-large-preview:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            request_timeout_secs: 120,
            stream_chunk_size: 50,
        }
    }
}

impl FileModelConfig {
    pub fn to_gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            base_url: self.base_url.clone(),
            api_key_env: self.api_key_env.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            stream_chunk_size: self.stream_chunk_size.max(1),
        }
    }
}
