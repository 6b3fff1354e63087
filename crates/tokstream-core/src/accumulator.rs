//! Folding of decoded tokens into a growing answer.

use serde::{Deserialize, Serialize};

/// Point-in-time view of an accumulation, published after every token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Everything accumulated so far.
    pub text: String,
    /// Number of tokens folded so far.
    pub tokens: usize,
}

/// Strict left fold over a token sequence: `text := text + token`.
///
/// Tokens are concatenated in arrival order with no separator, no
/// deduplication and no coalescing. Whether a token is one character or one
/// word is the producer's business.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAccumulator {
    text: String,
    tokens: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one token and returns the accumulated text.
    pub fn push(&mut self, token: &str) -> &str {
        self.text.push_str(token);
        self.tokens += 1;
        &self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn token_count(&self) -> usize {
        self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens == 0
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            tokens: self.tokens,
        }
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl<S: AsRef<str>> Extend<S> for StreamAccumulator {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for token in iter {
            self.push(token.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for StreamAccumulator {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut accumulator = Self::new();
        accumulator.extend(iter);
        accumulator
    }
}
