//! Token backends for tokstream.
//!
//! - [`HttpBackend`]: a remote endpoint speaking the token frame protocol
//! - [`SyntheticBackend`]: a built-in producer with canned replies, used
//!   when no endpoint is configured and as a deterministic test fixture

pub mod backend;
pub mod error;
pub mod http_backend;
pub mod request;
pub mod synthetic;

pub use backend::{ByteStream, TokenBackend};
pub use error::BackendError;
pub use http_backend::HttpBackend;
pub use request::{ChatMessage, ChatRequest};
pub use synthetic::{
    DEFAULT_TOKEN_DELAY, SyntheticBackend, SyntheticTokenProducer, canned_reply,
};
