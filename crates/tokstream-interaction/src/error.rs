use thiserror::Error;

/// Failures of a token backend. Every variant is fatal to the session that
/// triggered it and to nothing else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The collaborator answered with a non-success status.
    #[error("API error: {status}: {message}")]
    Status { status: u16, message: String },

    /// The collaborator answered 2xx but with a JSON error body instead of
    /// a stream.
    #[error("API error: {0}")]
    Remote(String),

    /// Connection, TLS or mid-stream read failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
