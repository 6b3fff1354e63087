//! Decoder and parser glued into one synchronous token pipeline.
//!
//! The only suspension point of a stream is waiting for the next chunk; once
//! a chunk is in hand, everything here runs to completion without blocking.

use crate::accumulator::StreamAccumulator;
use crate::protocol::{FrameDecoder, FrameStats, TokenFrameParser, TrailingLinePolicy};

/// Byte chunks in, tokens out.
#[derive(Debug, Default)]
pub struct TokenPipeline {
    decoder: FrameDecoder,
    parser: TokenFrameParser,
}

impl TokenPipeline {
    pub fn new(policy: TrailingLinePolicy) -> Self {
        Self {
            decoder: FrameDecoder::with_policy(policy),
            parser: TokenFrameParser::new(),
        }
    }

    /// Buffers `chunk` and returns the tokens it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Tokens<'_> {
        self.decoder.push(chunk);
        Tokens { pipeline: self }
    }

    /// Signals end of input and returns whatever tokens remain.
    pub fn finish(&mut self) -> Tokens<'_> {
        self.decoder.finish();
        Tokens { pipeline: self }
    }

    pub fn stats(&self) -> FrameStats {
        self.parser.stats()
    }
}

/// Tokens currently available from a [`TokenPipeline`].
#[derive(Debug)]
pub struct Tokens<'a> {
    pipeline: &'a mut TokenPipeline,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(line) = self.pipeline.decoder.next_line() {
            if let Some(token) = self.pipeline.parser.parse(&line) {
                return Some(token);
            }
        }
        None
    }
}

/// Runs a complete chunk sequence through decode, parse and fold.
pub fn reassemble<I>(chunks: I, policy: TrailingLinePolicy) -> StreamAccumulator
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut pipeline = TokenPipeline::new(policy);
    let mut accumulator = StreamAccumulator::new();
    for chunk in chunks {
        accumulator.extend(pipeline.feed(chunk.as_ref()));
    }
    accumulator.extend(pipeline.finish());
    accumulator
}
