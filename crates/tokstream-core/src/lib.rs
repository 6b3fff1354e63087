//! Domain core of tokstream.
//!
//! Data flow for one submitted query:
//!
//! ```text
//! byte chunks ─▶ FrameDecoder ─▶ lines ─▶ TokenFrameParser ─▶ tokens
//!     ─▶ StreamSession (StreamAccumulator) ─▶ ConversationStore
//! ```
//!
//! Everything here is synchronous except the history lock; waiting for bytes
//! is the caller's concern.

pub mod accumulator;
pub mod conversation;
pub mod error;
pub mod message;
pub mod pipeline;
pub mod protocol;
pub mod session;

pub use accumulator::{Snapshot, StreamAccumulator};
pub use conversation::{ConversationStore, Exchange};
pub use error::{Result, TokstreamError};
pub use message::{Message, MessageRole};
pub use pipeline::{TokenPipeline, reassemble};
pub use protocol::TrailingLinePolicy;
pub use session::{SessionFailure, SessionStatus, StreamSession};
