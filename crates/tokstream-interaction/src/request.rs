//! Outbound request shape.

use serde::{Deserialize, Serialize};
use tokstream_core::{Message, MessageRole};

/// One entry of a request's `messages` array.
///
/// The role stays a plain string on the wire so collaborators may use roles
/// this crate does not model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// Body sent to a backend: `{ "messages": [{ "role", "content" }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A request carrying a single user query.
    pub fn from_query(query: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(MessageRole::User, query)],
        }
    }

    /// A request carrying a whole conversation.
    pub fn from_history(history: &[Message]) -> Self {
        Self {
            messages: history.iter().map(ChatMessage::from).collect(),
        }
    }

    /// Content of the most recent user message.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User.as_str())
            .map(|m| m.content.as_str())
    }
}
