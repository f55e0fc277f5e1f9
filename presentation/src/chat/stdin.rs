//! One-shot mode: a single message read from stdin.

use shellpilot_application::{Conversation, GatewayError, NoAgentProgress};
use tokio::io::AsyncReadExt;

/// The message to send, or `None` when stdin held only whitespace.
pub fn prepare_input(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Read stdin to EOF.
pub async fn read_stdin() -> std::io::Result<String> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    Ok(input)
}

/// Send `message` with the system context and return the reply, trimmed.
/// `None` means the model answered with nothing.
pub async fn answer_once(
    conversation: &Conversation,
    message: &str,
) -> Result<Option<String>, GatewayError> {
    let reply = conversation.send(message, true, &NoAgentProgress).await?;
    let reply = reply.trim();
    Ok((!reply.is_empty()).then(|| reply.to_string()))
}
