//! Search service implementation.
//!
//! `SearchService` owns one conversation and drives a single streamed
//! answer at a time: it records the query, opens the backend, decodes the
//! byte stream into lines, folds their tokens into a [`StreamSession`] and
//! appends the finished answer to the history.

use crate::error::SearchError;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tokstream_core::protocol::{TokenFrameParser, decode_lines};
use tokstream_core::{ConversationStore, Message, SessionStatus, StreamSession, TrailingLinePolicy};
use tokstream_infrastructure::{AppConfig, BackendConfig, BackendKind, StreamConfig};
use tokstream_interaction::{ChatRequest, HttpBackend, SyntheticBackend, TokenBackend};

/// Reason recorded when the caller cancels a session.
pub const CANCELLED_BY_USER: &str = "cancelled by user";
/// Reason recorded when the backend does not answer within the open timeout.
pub const TIMED_OUT: &str = "timed out";

/// Progress notifications for a consumer rendering the answer live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    Started {
        session_id: String,
    },
    /// A token was folded in as the `tokens`-th of the answer. Concatenating
    /// every received `token` yields the answer so far.
    Token {
        token: String,
        tokens: usize,
    },
    Finished {
        status: SessionStatus,
        error: Option<String>,
    },
}

/// Tuning for how a stream is requested and decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub trailing_line: TrailingLinePolicy,
    /// Send the whole conversation instead of only the latest query.
    pub send_history: bool,
    /// Deadline for the backend to start answering.
    pub open_timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

impl From<&StreamConfig> for SearchOptions {
    fn from(config: &StreamConfig) -> Self {
        Self {
            trailing_line: config.trailing_line,
            send_history: config.send_history,
            open_timeout: config.open_timeout(),
        }
    }
}

/// Builds the backend selected by `config`.
pub fn backend_from_config(config: &BackendConfig) -> Arc<dyn TokenBackend> {
    match config.kind {
        BackendKind::Synthetic => Arc::new(SyntheticBackend::new(config.token_delay())),
        BackendKind::Http => Arc::new(HttpBackend::new(config.endpoint.clone())),
    }
}

/// Submits queries and streams their answers into a conversation.
pub struct SearchService {
    backend: Arc<dyn TokenBackend>,
    conversation: ConversationStore,
    options: SearchOptions,
    /// Held for the lifetime of one submission.
    active: Mutex<()>,
}

impl SearchService {
    pub fn new(
        backend: Arc<dyn TokenBackend>,
        conversation: ConversationStore,
        options: SearchOptions,
    ) -> Self {
        Self {
            backend,
            conversation,
            options,
            active: Mutex::new(()),
        }
    }

    /// Service with an empty conversation, configured from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            backend_from_config(&config.backend),
            ConversationStore::new(),
            SearchOptions::from(&config.stream),
        )
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Whether a submission is currently streaming.
    pub fn is_busy(&self) -> bool {
        self.active.try_lock().is_err()
    }

    /// Streams the answer to `query`.
    ///
    /// The query is appended to the conversation before the backend is
    /// contacted. The returned session is always terminal: `Complete` with
    /// its answer appended to the conversation, or `Failed` with whatever
    /// text arrived before the failure or cancellation. Only a blank query
    /// or a concurrent submission is reported as `Err`.
    ///
    /// # Arguments
    ///
    /// * `query` - The user's query; surrounding whitespace is trimmed
    /// * `updates` - Optional channel receiving progress notifications
    /// * `cancel` - Cancelling it stops the stream and keeps partial text
    pub async fn submit(
        &self,
        query: &str,
        updates: Option<mpsc::UnboundedSender<StreamUpdate>>,
        cancel: CancellationToken,
    ) -> Result<StreamSession, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let _active = self.active.try_lock().map_err(|_| SearchError::Busy)?;

        self.conversation.append(Message::user(query)).await;
        let mut session = StreamSession::new(query);
        tracing::info!(
            session_id = session.id(),
            backend = self.backend.name(),
            "session started"
        );
        notify(
            &updates,
            StreamUpdate::Started {
                session_id: session.id().to_string(),
            },
        );

        let request = if self.options.send_history {
            ChatRequest::from_history(&self.conversation.snapshot().await)
        } else {
            ChatRequest::from_query(query)
        };

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = tokio::time::timeout(self.options.open_timeout, self.backend.open(&request)) => Some(result),
        };
        let stream = match opened {
            None => {
                session.cancel(CANCELLED_BY_USER)?;
                None
            }
            Some(Err(_)) => {
                tracing::warn!(
                    session_id = session.id(),
                    timeout = ?self.options.open_timeout,
                    "backend did not answer in time"
                );
                cancel.cancel();
                session.cancel(TIMED_OUT)?;
                None
            }
            Some(Ok(Err(err))) => {
                tracing::warn!(session_id = session.id(), error = %err, "failed to open stream");
                session.fail(err.to_string())?;
                None
            }
            Some(Ok(Ok(stream))) => Some(stream),
        };

        if let Some(stream) = stream {
            let mut lines = Box::pin(decode_lines(stream, self.options.trailing_line));
            let mut parser = TokenFrameParser::new();
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        session.cancel(CANCELLED_BY_USER)?;
                        break;
                    }
                    next = lines.next() => next,
                };

                match next {
                    Some(Ok(line)) => {
                        if let Some(token) = parser.parse(&line) {
                            fold(&mut session, token, &updates)?;
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(session_id = session.id(), error = %err, "stream failed");
                        session.fail(err.to_string())?;
                        break;
                    }
                    None => {
                        self.conversation.materialize(&mut session).await?;
                        break;
                    }
                }
            }
            // The byte source is released here, before anyone observes the
            // terminal session.
            drop(lines);

            let stats = parser.stats();
            if stats.dropped() > 0 {
                tracing::debug!(
                    session_id = session.id(),
                    empty = stats.empty,
                    unknown = stats.unknown,
                    malformed = stats.malformed,
                    "frames dropped"
                );
            }
        }

        tracing::info!(
            session_id = session.id(),
            status = %session.status(),
            tokens = session.token_count(),
            "session finished"
        );
        notify(
            &updates,
            StreamUpdate::Finished {
                status: session.status(),
                error: session.error(),
            },
        );
        Ok(session)
    }
}

fn fold(
    session: &mut StreamSession,
    token: String,
    updates: &Option<mpsc::UnboundedSender<StreamUpdate>>,
) -> Result<(), SearchError> {
    session.push_token(&token)?;
    if let Some(tx) = updates {
        let tokens = session.token_count();
        // A consumer that went away does not stop the stream.
        let _ = tx.send(StreamUpdate::Token { token, tokens });
    }
    Ok(())
}

fn notify(updates: &Option<mpsc::UnboundedSender<StreamUpdate>>, update: StreamUpdate) {
    if let Some(tx) = updates {
        let _ = tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokstream_interaction::SyntheticBackend;

    fn service(reply: &str) -> SearchService {
        SearchService::new(
            Arc::new(SyntheticBackend::with_reply(reply, Duration::ZERO)),
            ConversationStore::new(),
            SearchOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_without_touching_history() {
        let service = service("answer");
        let err = service
            .submit("   ", None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_empty_query());
        assert!(service.conversation().is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_busy() {
        let service = service("answer");
        let _held = service.active.lock().await;
        assert!(service.is_busy());

        let err = service
            .submit("query", None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_busy());
        assert!(service.conversation().is_empty().await);
    }

    #[tokio::test]
    async fn test_updates_follow_tokens() {
        let service = service("héy");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let session = service
            .submit("query", Some(tx), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Complete);

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        assert_eq!(updates.len(), 5);
        assert!(matches!(updates[0], StreamUpdate::Started { .. }));
        assert_eq!(
            updates[2],
            StreamUpdate::Token {
                token: "é".to_string(),
                tokens: 2,
            }
        );
        let streamed: String = updates
            .iter()
            .filter_map(|update| match update {
                StreamUpdate::Token { token, .. } => Some(token.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, session.accumulated());
        assert_eq!(
            updates[4],
            StreamUpdate::Finished {
                status: SessionStatus::Complete,
                error: None,
            }
        );
    }

    #[test]
    fn test_options_follow_stream_config() {
        let config = StreamConfig {
            trailing_line: TrailingLinePolicy::Discard,
            send_history: true,
            open_timeout_secs: 5,
        };
        let options = SearchOptions::from(&config);
        assert_eq!(options.trailing_line, TrailingLinePolicy::Discard);
        assert!(options.send_history);
        assert_eq!(options.open_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_backend_from_config_follows_kind() {
        let mut config = BackendConfig::default();
        assert_eq!(backend_from_config(&config).name(), "synthetic");
        config.kind = BackendKind::Http;
        assert_eq!(backend_from_config(&config).name(), "http");
    }
}
