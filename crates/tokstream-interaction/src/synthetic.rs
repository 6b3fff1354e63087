//! Synthetic token producer.
//!
//! Stands in for a real model when none is configured. It speaks exactly
//! the wire format a real backend would, one frame per character, which also
//! makes it the reference fixture for decoder tests.

use crate::backend::{ByteStream, TokenBackend};
use crate::error::BackendError;
use crate::request::ChatRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokstream_core::protocol::encode_token_frame;

pub const DEFAULT_TOKEN_DELAY: Duration = Duration::from_millis(20);

const REPLY_DEFAULT: &str = "Hello! This is a synthetic answer. To get real answers, point tokstream at an HTTP endpoint.\n\n\
How to configure it:\n\
1. Start a server that speaks the token frame protocol\n\
2. Add to ~/.config/tokstream/config.toml:\n   [backend]\n   kind = \"http\"\n   endpoint = \"http://host/api/ai-search\"\n\
3. Or export TOKSTREAM_BACKEND=http TOKSTREAM_ENDPOINT=<url>";

const REPLY_NEXT: &str = "Next.js is a full-stack framework built on React. Key features:\n\n\
1. **App Router**: the current routing system\n\
2. **Server Components**: rendering on the server\n\
3. **Turbopack**: a fast bundler\n\
4. **API Routes**: backend endpoints next to the UI\n\n\
※ This is a synthetic answer.";

const REPLY_TYPESCRIPT: &str = "TypeScript is JavaScript with static types.\n\n\
Main benefits:\n\
- Type checking at compile time\n\
- Better editor completion\n\
- Bugs found earlier\n\
- Easier maintenance\n\n\
※ This is a synthetic answer.";

const REPLY_REACT: &str = "React is a JavaScript library for building user interfaces.\n\n\
Core ideas:\n\
- Components\n\
- Declarative UI\n\
- Virtual DOM\n\
- Hooks (useState, useEffect, …)\n\n\
※ This is a synthetic answer.";

/// Picks a canned reply by keyword, case-insensitively.
pub fn canned_reply(query: &str) -> &'static str {
    let query = query.to_lowercase();
    if query.contains("next") {
        REPLY_NEXT
    } else if query.contains("typescript") {
        REPLY_TYPESCRIPT
    } else if query.contains("react") {
        REPLY_REACT
    } else {
        REPLY_DEFAULT
    }
}

/// Emits a fixed reply as one token frame per character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticTokenProducer {
    reply: String,
    delay: Duration,
}

impl SyntheticTokenProducer {
    pub fn new(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            reply: reply.into(),
            delay,
        }
    }

    /// Producer for the canned reply matching `query`.
    pub fn for_query(query: &str, delay: Duration) -> Self {
        Self::new(canned_reply(query), delay)
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The encoded frames, without any delay.
    pub fn frames(&self) -> impl Iterator<Item = String> + '_ {
        self.reply
            .chars()
            .map(|c| encode_token_frame(c.encode_utf8(&mut [0; 4])))
    }

    /// The encoded frames as a byte stream, `delay` apart, ending after the
    /// last character.
    pub fn into_stream(self) -> impl Stream<Item = Bytes> + Send + 'static {
        let Self { reply, delay } = self;
        async_stream::stream! {
            for (index, c) in reply.chars().enumerate() {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Bytes::from(encode_token_frame(c.encode_utf8(&mut [0; 4])));
            }
        }
    }
}

/// [`TokenBackend`] backed by [`SyntheticTokenProducer`].
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    delay: Duration,
    fixed_reply: Option<String>,
}

impl SyntheticBackend {
    /// Answers with the canned reply matching the latest user message.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fixed_reply: None,
        }
    }

    /// Answers every request with `reply`.
    pub fn with_reply(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            delay,
            fixed_reply: Some(reply.into()),
        }
    }

    pub fn producer_for(&self, request: &ChatRequest) -> SyntheticTokenProducer {
        match &self.fixed_reply {
            Some(reply) => SyntheticTokenProducer::new(reply.clone(), self.delay),
            None => SyntheticTokenProducer::for_query(
                request.last_user_content().unwrap_or_default(),
                self.delay,
            ),
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_DELAY)
    }
}

#[async_trait]
impl TokenBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, BackendError> {
        let producer = self.producer_for(request);
        tracing::debug!(chars = producer.reply().chars().count(), "opening synthetic stream");
        Ok(producer.into_stream().map(Ok::<Bytes, BackendError>).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_reply_by_keyword() {
        assert_eq!(canned_reply("Tell me about Next.js"), REPLY_NEXT);
        assert_eq!(canned_reply("What is TYPESCRIPT?"), REPLY_TYPESCRIPT);
        assert_eq!(canned_reply("react features"), REPLY_REACT);
        assert_eq!(canned_reply("hello"), REPLY_DEFAULT);
        assert_eq!(canned_reply(""), REPLY_DEFAULT);
    }

    #[test]
    fn test_one_frame_per_character() {
        let producer = SyntheticTokenProducer::new("a\"\n※", Duration::ZERO);
        let frames: Vec<String> = producer.frames().collect();
        assert_eq!(
            frames,
            vec!["0:\"a\"\n", "0:\"\\\"\"\n", "0:\"\\n\"\n", "0:\"※\"\n"]
        );
    }

    #[test]
    fn test_fixed_reply_ignores_query() {
        let backend = SyntheticBackend::with_reply("fixed", Duration::ZERO);
        let producer = backend.producer_for(&ChatRequest::from_query("react"));
        assert_eq!(producer.reply(), "fixed");
    }

    #[tokio::test]
    async fn test_stream_matches_frames() {
        let producer = SyntheticTokenProducer::new("héllo", Duration::ZERO);
        let expected: Vec<Bytes> = producer.frames().map(Bytes::from).collect();
        let streamed: Vec<Bytes> = producer.into_stream().collect().await;
        assert_eq!(streamed, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_frames() {
        let delay = Duration::from_millis(20);
        let producer = SyntheticTokenProducer::new("abc", delay);
        let start = tokio::time::Instant::now();

        let frames: Vec<Bytes> = producer.into_stream().collect().await;

        assert_eq!(frames.len(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
        assert!(elapsed < delay * 3, "elapsed {elapsed:?}");
    }
}
