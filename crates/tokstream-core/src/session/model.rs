//! Stream session domain model.
//!
//! A [`StreamSession`] is the transient state of one query/answer exchange.
//! It is owned by the request that created it and is never shared.

use crate::accumulator::StreamAccumulator;
use crate::error::{Result, TokstreamError};
use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle status of a stream session.
///
/// ```text
/// Pending ──first token──▶ Streaming ──end of stream──▶ Complete
///    │                         │
///    └──────────┬──────────────┘
///               ▼
///            Failed (transport error or cancellation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Streaming,
    Complete,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Complete => "complete",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended in [`SessionStatus::Failed`].
///
/// Cancellation is caller-initiated, not a fault, and is kept apart from
/// transport failures so callers can present it differently.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SessionFailure {
    /// Byte source error, non-success status, or collaborator error body.
    #[error("{0}")]
    Transport(String),
    /// The consumer abandoned the session.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl SessionFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionFailure::Cancelled(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            SessionFailure::Transport(reason) | SessionFailure::Cancelled(reason) => reason,
        }
    }
}

/// One in-flight request/response cycle.
///
/// `accumulated` only grows while the session is pending or streaming, and
/// is kept as-is when the session fails: partial answers are surfaced, never
/// silently discarded.
#[derive(Debug, Clone)]
pub struct StreamSession {
    id: String,
    query: String,
    accumulator: StreamAccumulator,
    status: SessionStatus,
    failure: Option<SessionFailure>,
    created_at: DateTime<Utc>,
}

impl StreamSession {
    /// Creates a pending session for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            accumulator: StreamAccumulator::new(),
            status: SessionStatus::Pending,
            failure: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn accumulated(&self) -> &str {
        self.accumulator.as_str()
    }

    pub fn token_count(&self) -> usize {
        self.accumulator.token_count()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Human-readable error, present only for failed sessions.
    pub fn error(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn is_cancelled(&self) -> bool {
        self.failure
            .as_ref()
            .is_some_and(SessionFailure::is_cancelled)
    }

    /// Folds one token into the answer. The first token moves the session
    /// from pending to streaming.
    pub fn push_token(&mut self, token: &str) -> Result<&str> {
        self.ensure_active(SessionStatus::Streaming)?;
        self.status = SessionStatus::Streaming;
        Ok(self.accumulator.push(token))
    }

    /// Marks the stream as ended without error and returns the resulting
    /// assistant message. The accumulated text is frozen from here on.
    pub fn complete(&mut self) -> Result<Message> {
        self.ensure_active(SessionStatus::Complete)?;
        self.status = SessionStatus::Complete;
        Ok(Message::assistant(self.accumulator.as_str()))
    }

    /// Marks the session as failed by a transport or protocol-fatal error.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.terminate(SessionFailure::Transport(reason.into()))
    }

    /// Marks the session as abandoned by its consumer.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<()> {
        self.terminate(SessionFailure::Cancelled(reason.into()))
    }

    fn terminate(&mut self, failure: SessionFailure) -> Result<()> {
        self.ensure_active(SessionStatus::Failed)?;
        self.status = SessionStatus::Failed;
        self.failure = Some(failure);
        Ok(())
    }

    fn ensure_active(&self, to: SessionStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TokstreamError::invalid_transition(
                self.status.as_str(),
                to.as_str(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_pending_and_empty() {
        let session = StreamSession::new("What is Next.js?");
        assert_eq!(session.status(), SessionStatus::Pending);
        assert_eq!(session.query(), "What is Next.js?");
        assert_eq!(session.accumulated(), "");
        assert!(session.is_active());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_first_token_starts_streaming() {
        let mut session = StreamSession::new("q");
        assert_eq!(session.push_token("A").unwrap(), "A");
        assert_eq!(session.status(), SessionStatus::Streaming);
        assert_eq!(session.push_token("B").unwrap(), "AB");
        assert_eq!(session.token_count(), 2);
    }

    #[test]
    fn test_complete_produces_assistant_message() {
        let mut session = StreamSession::new("q");
        session.push_token("done").unwrap();

        let message = session.complete().unwrap();
        assert!(message.is_assistant());
        assert_eq!(message.content, "done");
        assert_eq!(session.status(), SessionStatus::Complete);
    }

    #[test]
    fn test_complete_without_tokens_is_allowed() {
        let mut session = StreamSession::new("q");
        let message = session.complete().unwrap();
        assert_eq!(message.content, "");
    }

    #[test]
    fn test_failure_keeps_partial_text() {
        let mut session = StreamSession::new("q");
        session.push_token("par").unwrap();
        session.fail("API error: 500").unwrap();

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.accumulated(), "par");
        assert_eq!(session.error().as_deref(), Some("API error: 500"));
        assert!(!session.is_cancelled());
    }

    #[test]
    fn test_cancel_is_distinguished_from_fault() {
        let mut session = StreamSession::new("q");
        session.push_token("x").unwrap();
        session.cancel("user navigated away").unwrap();

        assert_eq!(session.status(), SessionStatus::Failed);
        assert!(session.is_cancelled());
        assert_eq!(session.failure().unwrap().reason(), "user navigated away");
        assert_eq!(
            session.error().as_deref(),
            Some("cancelled: user navigated away")
        );
    }

    #[test]
    fn test_terminal_sessions_reject_further_changes() {
        let mut session = StreamSession::new("q");
        session.push_token("a").unwrap();
        session.cancel("stop").unwrap();

        let err = session.push_token("b").unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(session.accumulated(), "a");

        assert!(session.complete().is_err());
        assert!(session.fail("late").is_err());
        assert!(session.is_cancelled());
    }

    #[test]
    fn test_failure_serializes_with_kind_tag() {
        let failure = SessionFailure::Cancelled("timed out".into());
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "cancelled");
        assert_eq!(json["reason"], "timed out");
    }
}
