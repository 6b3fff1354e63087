//! Application layer for tokstream.
//!
//! Wires a token backend, the decode pipeline and a conversation together
//! into one submit-and-stream use case.

pub mod error;
pub mod search_service;

pub use error::SearchError;
pub use search_service::{
    CANCELLED_BY_USER, SearchOptions, SearchService, StreamUpdate, TIMED_OUT, backend_from_config,
};
