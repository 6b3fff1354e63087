//! Conversation history.
//!
//! [`ConversationStore`] is the append-only, in-memory history of finished
//! messages. It is a cheap handle over shared state: clones see the same
//! history, and every read and mutation goes through one lock so no append
//! can interleave with another.

use crate::error::Result;
use crate::message::Message;
use crate::session::StreamSession;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A user query paired with the answer it received, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub query: Message,
    pub answer: Option<Message>,
}

/// Ordered history of messages, chronological by insertion.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from previously captured messages.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(messages)),
        }
    }

    /// Adds `message` to the end of the history.
    pub async fn append(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    /// Returns the full ordered history.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Empties the history.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub async fn last(&self) -> Option<Message> {
        self.messages.read().await.last().cloned()
    }

    /// Completes `session` and appends its answer as an assistant message.
    ///
    /// Fails without touching the history if the session already reached a
    /// terminal state.
    pub async fn materialize(&self, session: &mut StreamSession) -> Result<Message> {
        let message = session.complete()?;
        self.append(message.clone()).await;
        tracing::debug!(
            session_id = session.id(),
            message_id = %message.id,
            chars = message.content.chars().count(),
            "appended assistant message"
        );
        Ok(message)
    }

    /// Pairs each user message with the assistant message that follows it,
    /// newest exchange first. Queries that never got an answer are included
    /// with `answer: None`.
    pub async fn exchanges(&self) -> Vec<Exchange> {
        let messages = self.messages.read().await;
        let mut exchanges: Vec<Exchange> = Vec::new();

        for message in messages.iter() {
            if message.is_user() {
                exchanges.push(Exchange {
                    query: message.clone(),
                    answer: None,
                });
            } else if let Some(open) = exchanges.last_mut().filter(|e| e.answer.is_none()) {
                open.answer = Some(message.clone());
            }
        }

        exchanges.reverse();
        exchanges
    }

    /// Removes the query and answer of `exchange`. Returns `false` if the
    /// query is no longer in the history.
    pub async fn remove_exchange(&self, exchange: &Exchange) -> bool {
        let mut messages = self.messages.write().await;
        if !messages.iter().any(|m| m.id == exchange.query.id) {
            return false;
        }
        let answer_id = exchange.answer.as_ref().map(|m| m.id.as_str());
        messages.retain(|m| m.id != exchange.query.id && Some(m.id.as_str()) != answer_id);
        tracing::debug!(query_id = %exchange.query.id, "removed exchange");
        true
    }
}
