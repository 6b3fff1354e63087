//! Token frame classification and encoding.
//!
//! A token frame is a line `0:<json string>`. Every other line is ignored so
//! that new frame kinds (errors, metadata) can be added by a producer
//! without breaking older consumers. Individual frames that fail to decode
//! are dropped; they never abort the stream.

use serde_json::Value;

/// Prefix that marks a token frame.
pub const TOKEN_SENTINEL: &str = "0:";

/// Classification of one decoded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// A token frame carrying this text.
    Token(String),
    /// Blank line.
    Empty,
    /// A line with some other (or no) sentinel.
    Unknown,
    /// A token frame whose payload is not a JSON string.
    Malformed,
}

impl FrameKind {
    /// Classifies a line with its newline already stripped.
    pub fn classify(line: &str) -> Self {
        if line.trim().is_empty() {
            return FrameKind::Empty;
        }
        let Some(payload) = line.strip_prefix(TOKEN_SENTINEL) else {
            return FrameKind::Unknown;
        };
        match serde_json::from_str::<Value>(payload.trim()) {
            Ok(Value::String(text)) => FrameKind::Token(text),
            _ => FrameKind::Malformed,
        }
    }
}

/// Per-stream counters of how lines were classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub tokens: usize,
    pub empty: usize,
    pub unknown: usize,
    pub malformed: usize,
}

impl FrameStats {
    /// Lines that did not produce a token.
    pub fn dropped(&self) -> usize {
        self.empty + self.unknown + self.malformed
    }
}

/// Extracts token payloads from decoded lines.
///
/// Dropped lines are invisible to the caller; they are only counted in
/// [`FrameStats`] and logged at debug level.
#[derive(Debug, Default)]
pub struct TokenFrameParser {
    stats: FrameStats,
}

impl TokenFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token carried by `line`, if it is a valid token frame.
    pub fn parse(&mut self, line: &str) -> Option<String> {
        match FrameKind::classify(line) {
            FrameKind::Token(text) => {
                self.stats.tokens += 1;
                Some(text)
            }
            FrameKind::Empty => {
                self.stats.empty += 1;
                None
            }
            FrameKind::Unknown => {
                self.stats.unknown += 1;
                tracing::debug!(line, "skipping frame with unrecognized sentinel");
                None
            }
            FrameKind::Malformed => {
                self.stats.malformed += 1;
                tracing::debug!(line, "dropping token frame with non-string payload");
                None
            }
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Encodes `text` as one token frame, newline included.
///
/// The payload is a JSON string literal, so quotes, backslashes and control
/// characters (including `\n`) are escaped and the frame stays on one line.
pub fn encode_token_frame(text: &str) -> String {
    let payload = Value::String(text.to_owned());
    format!("{TOKEN_SENTINEL}{payload}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_token() {
        assert_eq!(
            FrameKind::classify("0:\"hello\""),
            FrameKind::Token("hello".to_string())
        );
        assert_eq!(
            FrameKind::classify("0:  \"padded\"  "),
            FrameKind::Token("padded".to_string())
        );
    }

    #[test]
    fn test_classify_escaped_payload() {
        assert_eq!(
            FrameKind::classify(r#"0:"line\nbreak \"quoted\" \\""#),
            FrameKind::Token("line\nbreak \"quoted\" \\".to_string())
        );
    }

    #[test]
    fn test_classify_drops() {
        assert_eq!(FrameKind::classify(""), FrameKind::Empty);
        assert_eq!(FrameKind::classify("   "), FrameKind::Empty);
        assert_eq!(FrameKind::classify("1:\"ignored\""), FrameKind::Unknown);
        assert_eq!(FrameKind::classify("data: x"), FrameKind::Unknown);
        assert_eq!(FrameKind::classify("0:not-json"), FrameKind::Malformed);
        assert_eq!(FrameKind::classify("0:123"), FrameKind::Malformed);
        assert_eq!(FrameKind::classify("0:"), FrameKind::Malformed);
        assert_eq!(FrameKind::classify("0:[\"a\"]"), FrameKind::Malformed);
    }

    #[test]
    fn test_empty_string_payload_is_a_token() {
        assert_eq!(FrameKind::classify("0:\"\""), FrameKind::Token(String::new()));
    }

    #[test]
    fn test_parser_counts_every_kind() {
        let mut parser = TokenFrameParser::new();
        let lines = ["0:\"a\"", "", "2:{}", "0:null", "0:\"b\""];
        let tokens: Vec<String> = lines.iter().filter_map(|l| parser.parse(l)).collect();

        assert_eq!(tokens, vec!["a", "b"]);
        assert_eq!(
            parser.stats(),
            FrameStats {
                tokens: 2,
                empty: 1,
                unknown: 1,
                malformed: 1,
            }
        );
        assert_eq!(parser.stats().dropped(), 3);
    }

    #[test]
    fn test_encode_escapes_control_characters() {
        assert_eq!(encode_token_frame("A"), "0:\"A\"\n");
        assert_eq!(encode_token_frame("\n"), "0:\"\\n\"\n");
        assert_eq!(encode_token_frame("\\"), "0:\"\\\\\"\n");
        assert_eq!(encode_token_frame("\""), "0:\"\\\"\"\n");
    }

    #[test]
    fn test_encode_then_classify_preserves_text() {
        for text in ["plain", "tab\there", "日本語", "emoji 🦀", "\u{0007}"] {
            let frame = encode_token_frame(text);
            let line = frame.strip_suffix('\n').unwrap();
            assert!(!line.contains('\n'));
            assert_eq!(FrameKind::classify(line), FrameKind::Token(text.to_string()));
        }
    }
}
