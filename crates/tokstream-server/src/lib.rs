//! Reference endpoint for the token frame protocol.
//!
//! Serves `POST /api/ai-search` with the synthetic producer so the HTTP
//! backend can be exercised end to end without a real model.

pub mod error;
pub mod http;

pub use error::{ApiError, ServerError};
pub use http::{
    AppState, HEALTH_PATH, SEARCH_PATH, latest_user_query, router, serve, text_stream_response,
};
