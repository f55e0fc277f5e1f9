//! Model transport port
//!
//! A gateway opens sessions; a session holds one chat history and turns a
//! message into a reply, optionally streamed.

use async_trait::async_trait;
use shellpilot_domain::StreamEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport failures. Each one ends the current turn.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timed out waiting for the model")]
    Timeout,

    #[error("Reply stream interrupted: {0}")]
    StreamInterrupted(String),
}

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Open a session with an empty history.
    async fn create_session(&self, model: &str) -> Result<Box<dyn LlmSession>, GatewayError>;

    /// Open a session whose history starts with `system_prompt`.
    async fn create_session_with_system_prompt(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// Receiving end of a streamed reply.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }
}

#[async_trait]
pub trait LlmSession: Send + Sync {
    fn model(&self) -> &str;

    /// Append `content` to the history and wait for the whole reply.
    async fn send(&self, content: &str) -> Result<String, GatewayError>;

    /// Like [`send`](Self::send), but the reply arrives as [`StreamEvent`]s.
    ///
    /// Transports without streaming can rely on the default, which yields a
    /// single `Completed` event.
    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        let reply = self.send(content).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(StreamEvent::Completed(reply)).await;
        Ok(StreamHandle::new(rx))
    }
}
