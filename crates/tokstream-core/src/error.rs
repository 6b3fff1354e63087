//! Error types for the tokstream core.

use thiserror::Error;

/// A shared error type for the tokstream domain layer.
///
/// Frame-level and character-level decode problems never surface here; they
/// are recovered inside the protocol module. What remains is misuse of the
/// session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokstreamError {
    /// A session was asked to move to a state its lifecycle does not allow.
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl TokstreamError {
    pub fn invalid_transition(from: &'static str, to: &'static str) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

/// A type alias for `Result<T, TokstreamError>`.
pub type Result<T> = std::result::Result<T, TokstreamError>;
