//! Conversation use case
//!
//! Owns the model session for one REPL lifetime and pushes turns through it,
//! streaming reply chunks to the progress notifier as they arrive.

use crate::ports::agent_progress::AgentProgressNotifier;
use crate::ports::context_provider::SystemContextProvider;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmSession};
use serde_json::json;
use shellpilot_domain::StreamEvent;
use std::sync::Arc;
use tracing::debug;

pub struct Conversation {
    session: Box<dyn LlmSession>,
    context: Arc<dyn SystemContextProvider>,
    logger: Arc<dyn ConversationLogger>,
}

impl Conversation {
    pub fn new(session: Box<dyn LlmSession>, context: Arc<dyn SystemContextProvider>) -> Self {
        Self {
            session,
            context,
            logger: Arc::new(NoConversationLogger),
        }
    }

    /// Set a conversation logger for structured event logging.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn model(&self) -> &str {
        self.session.model()
    }

    /// Push one turn and wait for the full reply.
    ///
    /// User turns set `include_context` so the model sees the current OS,
    /// user and directory. Feedback turns do not.
    pub async fn send(
        &self,
        message: &str,
        include_context: bool,
        progress: &dyn AgentProgressNotifier,
    ) -> Result<String, GatewayError> {
        let outgoing = if include_context {
            self.context.system_context().wrap(message)
        } else {
            message.to_string()
        };

        self.logger.log(ConversationEvent::new(
            "user_message",
            json!({
                "model": self.session.model(),
                "include_context": include_context,
                "bytes": outgoing.len(),
                "text": outgoing,
            }),
        ));

        let handle = self.session.send_streaming(&outgoing).await?;
        let mut receiver = handle.receiver;
        let mut full_text = String::new();

        progress.on_llm_stream_start();
        while let Some(event) = receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    progress.on_llm_chunk(&chunk);
                    full_text.push_str(&chunk);
                }
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        progress.on_llm_chunk(&text);
                        full_text = text;
                    }
                    break;
                }
                StreamEvent::Error(e) => {
                    progress.on_llm_stream_end();
                    return Err(GatewayError::StreamInterrupted(e));
                }
            }
        }
        progress.on_llm_stream_end();

        debug!(bytes = full_text.len(), "model reply received");
        self.logger.log(ConversationEvent::new(
            "llm_response",
            json!({
                "model": self.session.model(),
                "bytes": full_text.len(),
                "text": full_text,
            }),
        ));

        Ok(full_text)
    }
}
