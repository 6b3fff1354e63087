//! Incremental line decoder for the token stream body.
//!
//! Transports hand us byte chunks whose boundaries have nothing to do with
//! lines or characters. [`FrameDecoder`] buffers the unterminated tail of the
//! stream and yields each complete line once its `\n` arrives.
//!
//! Splitting happens on raw bytes: `0x0A` never occurs inside a multi-byte
//! UTF-8 sequence, so a character cut by a chunk boundary simply stays in the
//! buffered tail until the rest of it arrives. Text decoding is applied per
//! complete line and is lossy, so malformed bytes become U+FFFD instead of
//! aborting the stream.

use bytes::{Buf, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// What to do with bytes left over after the final `\n` when input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingLinePolicy {
    /// Yield the unterminated tail as a final line.
    #[default]
    Flush,
    /// Drop the unterminated tail.
    Discard,
}

/// Byte-chunk to line decoder.
///
/// Feed chunks with [`push`](Self::push), pull lines with
/// [`next_line`](Self::next_line), and call [`finish`](Self::finish) once
/// the input has ended. A finished decoder is not restartable: further
/// pushes are ignored.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    /// Prefix of `buffer` already known to contain no newline.
    scanned: usize,
    policy: TrailingLinePolicy,
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TrailingLinePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> TrailingLinePolicy {
        self.policy
    }

    /// Appends a chunk of raw bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.finished {
            tracing::debug!(len = chunk.len(), "ignoring chunk pushed after end of input");
            return;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Marks the end of input. Remaining complete lines are still returned
    /// by [`next_line`](Self::next_line), followed by the unterminated tail
    /// if the policy is [`TrailingLinePolicy::Flush`].
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of bytes waiting for a line terminator.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the next complete line with its `\n` stripped, or `None` when
    /// more input is needed (or the input is exhausted).
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n');

        if let Some(offset) = newline {
            let end = self.scanned + offset;
            let line = self.buffer.split_to(end);
            self.buffer.advance(1);
            self.scanned = 0;
            return Some(decode_text(&line));
        }

        self.scanned = self.buffer.len();
        if !self.finished || self.buffer.is_empty() {
            return None;
        }

        let tail = self.buffer.split();
        self.scanned = 0;
        match self.policy {
            TrailingLinePolicy::Flush => Some(decode_text(&tail)),
            TrailingLinePolicy::Discard => {
                tracing::debug!(len = tail.len(), "discarding unterminated trailing line");
                None
            }
        }
    }
}

fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Lazy iterator of lines over an iterator of byte chunks.
///
/// Pulls a new chunk only when the buffered bytes hold no complete line.
#[derive(Debug)]
pub struct Frames<I> {
    chunks: I,
    decoder: FrameDecoder,
}

impl<I> Frames<I> {
    pub fn new(chunks: I, policy: TrailingLinePolicy) -> Self {
        Self {
            chunks,
            decoder: FrameDecoder::with_policy(policy),
        }
    }
}

impl<I, B> Iterator for Frames<I>
where
    I: Iterator<Item = B>,
    B: AsRef<[u8]>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(line) = self.decoder.next_line() {
                return Some(line);
            }
            if self.decoder.is_finished() {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => self.decoder.push(chunk.as_ref()),
                None => self.decoder.finish(),
            }
        }
    }
}

/// Convenience constructor for [`Frames`].
pub fn frames<I>(chunks: I, policy: TrailingLinePolicy) -> Frames<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Frames::new(chunks.into_iter(), policy)
}

/// Async counterpart of [`frames`] for transport streams.
///
/// Lines are yielded as soon as their chunk arrives. The first `Err` is
/// passed through unchanged and ends the stream; the trailing line policy
/// applies only when the chunks end cleanly.
pub fn decode_lines<S, B, E>(
    chunks: S,
    policy: TrailingLinePolicy,
) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let mut decoder = FrameDecoder::with_policy(policy);
        futures::pin_mut!(chunks);
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => {
                    decoder.push(chunk.as_ref());
                    while let Some(line) = decoder.next_line() {
                        yield Ok(line);
                    }
                }
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
        }
        decoder.finish();
        while let Some(line) = decoder.next_line() {
            yield Ok(line);
        }
    }
}
