//! Chat history kept on our side of the transport

use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message, in the shape chat-completion APIs expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }
}

/// Conversation history held on our side of the transport.
///
/// The system prompt, when present, is always the first message.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    model: String,
    messages: Vec<Message>,
}

impl Session {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            messages: Vec::new(),
        }
    }

    pub fn with_system_prompt(
        id: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let mut session = Self::new(id, model);
        session.messages.push(Message::system(system_prompt));
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Drop the last message if it is an unanswered user turn.
    pub fn rollback_user_message(&mut self) {
        if self.messages.last().map(|m| m.role) == Some(Role::User) {
            self.messages.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_goes_first() {
        let mut session = Session::with_system_prompt("s1", "m", "be terse");
        session.add_user_message("hi");
        session.add_assistant_message("hello");
        assert_eq!(session.messages()[0], Message::system("be terse"));
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn rollback_only_removes_user_turn() {
        let mut session = Session::new("s1", "m");
        session.add_user_message("hi");
        session.rollback_user_message();
        assert!(session.messages().is_empty());

        session.add_user_message("hi");
        session.add_assistant_message("hello");
        session.rollback_user_message();
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("x")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"x"}"#);
    }
}
