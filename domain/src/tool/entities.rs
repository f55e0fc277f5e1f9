//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::util::truncate_str;

/// Parameters of a tool call, keyed by name.
///
/// Ordered so that previews and logs render deterministically.
pub type ToolParams = BTreeMap<String, serde_json::Value>;

/// Longest string value shown verbatim in [`ToolCall::preview`].
const PREVIEW_VALUE_MAX: usize = 60;

/// A call to a tool with arguments, as emitted by the model.
///
/// The parser only guarantees that `arguments` came from a JSON object.
/// Whether the shape is right for the named tool is decided by the tool
/// handler itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments passed to the tool
    pub arguments: ToolParams,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: ToolParams::new(),
        }
    }

    pub fn with_arguments(tool_name: impl Into<String>, arguments: ToolParams) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional i64 argument.
    ///
    /// Models often quote numbers, so numeric strings are accepted too.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.arguments.get(key)? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }

    /// One-line rendering shown to the human before the call runs,
    /// e.g. `read_file({"path":"a.txt"})`.
    pub fn preview(&self) -> String {
        let shortened: serde_json::Map<String, serde_json::Value> = self
            .arguments
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) if s.len() > PREVIEW_VALUE_MAX => {
                        let head = truncate_str(s, PREVIEW_VALUE_MAX).replace('\n', "\\n");
                        serde_json::Value::String(format!("{}… ({} bytes)", head, s.len()))
                    }
                    other => other.clone(),
                };
                (k.clone(), v)
            })
            .collect();
        let params = serde_json::Value::Object(shortened).to_string();
        format!("{}({})", self.tool_name, params)
    }
}
