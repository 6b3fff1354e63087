//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: the stream session state machine (`StreamSession`,
//!   `SessionStatus`, `SessionFailure`)

mod model;

pub use model::{SessionFailure, SessionStatus, StreamSession};
