//! Tool Registry
//!
//! The [`ToolRegistry`] maps tool names to async handlers and implements
//! [`ToolExecutorPort`]. Registration order is kept for the tool list the
//! model sees; registering an existing name replaces its handler and
//! description in place.
//!
//! # Usage
//!
//! ```ignore
//! use shellpilot_infrastructure::tools::ToolRegistry;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register("echo", |call| async move {
//!     Ok(call.get_string("text").unwrap_or_default().to_string())
//! }, r#"Echo text. Params: {"text": "hi"}"#);
//!
//! let out = registry.execute(&ToolCall::new("echo").with_arg("text", "hi")).await;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use shellpilot_application::ports::tool_executor::ToolExecutorPort;
use shellpilot_domain::{ToolCall, ToolError};
use tracing::debug;

use super::lsp::LspPool;

/// Type-erased tool handler.
pub type ToolHandler =
    Arc<dyn Fn(ToolCall) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync>;

struct ToolEntry {
    name: String,
    description: String,
    handler: ToolHandler,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
    /// Tool name -> position in `tools`
    index: HashMap<String, usize>,
    /// Language servers started by `code_intel`, stopped on shutdown.
    lsp: Option<Arc<LspPool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. An existing tool of the same name is
    /// replaced and keeps its position.
    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        handler: F,
        description: impl Into<String>,
    ) where
        F: Fn(ToolCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let name = name.into();
        let entry = ToolEntry {
            name: name.clone(),
            description: description.into(),
            handler: Arc::new(move |call| -> BoxFuture<'static, Result<String, ToolError>> {
                Box::pin(handler(call))
            }),
        };
        match self.index.get(&name) {
            Some(&pos) => {
                debug!("Replacing tool {}", name);
                self.tools[pos] = entry;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(entry);
            }
        }
    }

    /// Attach the language-server pool so `shutdown` can stop it.
    pub fn set_lsp_pool(&mut self, pool: Arc<LspPool>) {
        self.lsp = Some(pool);
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Stop helper processes owned by tools.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.lsp {
            pool.shutdown().await;
        }
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn tool_list(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let handler = match self.index.get(&call.tool_name) {
            Some(&pos) => Arc::clone(&self.tools[pos].handler),
            None => return Err(ToolError::unknown_tool(&call.tool_name)),
        };
        debug!("Dispatching {}", call.preview());
        handler(call.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellpilot_domain::tool::value_objects::{EXECUTION_FAILED, UNKNOWN_TOOL};

    fn echo_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(
            "echo",
            |call: ToolCall| async move { Ok(call.get_string("text").unwrap_or("").to_string()) },
            "Echo text",
        );
        registry.register(
            "fail",
            |_call: ToolCall| async move { Err(ToolError::execution_failed("boom")) },
            "Always fails",
        );
        registry
    }

    #[tokio::test]
    async fn test_dispatch() {
        let registry = echo_registry();
        let out = registry
            .execute(&ToolCall::new("echo").with_arg("text", "hi"))
            .await
            .unwrap();
        assert_eq!(out, "hi");

        let err = registry.execute(&ToolCall::new("fail")).await.unwrap_err();
        assert_eq!(err.code, EXECUTION_FAILED);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = echo_registry();
        let err = registry
            .execute(&ToolCall::new("frobnicate"))
            .await
            .unwrap_err();
        assert_eq!(err.code, UNKNOWN_TOOL);
        assert_eq!(err.message, "Tool not found: frobnicate");
    }

    #[test]
    fn test_tool_list_in_registration_order() {
        let registry = echo_registry();
        assert_eq!(registry.tool_list(), "- echo: Echo text\n- fail: Always fails");
        assert!(registry.has_tool("echo"));
        assert!(!registry.has_tool("nope"));
    }

    #[tokio::test]
    async fn test_collision_overwrites_in_place() {
        let mut registry = echo_registry();
        registry.register(
            "echo",
            |_call: ToolCall| async move { Ok("replaced".to_string()) },
            "Replaced echo",
        );

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tool_names(), vec!["echo", "fail"]);
        assert_eq!(
            registry.tool_list(),
            "- echo: Replaced echo\n- fail: Always fails"
        );
        let out = registry.execute(&ToolCall::new("echo")).await.unwrap();
        assert_eq!(out, "replaced");
    }

    #[tokio::test]
    async fn test_shutdown_without_helpers() {
        let registry = echo_registry();
        registry.shutdown().await;
    }
}
