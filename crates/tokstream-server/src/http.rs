//! Reference HTTP endpoint.
//!
//! Validates `{ "messages": [{ "role", "content" }] }` and answers with the
//! synthetic reply for the latest user message, streamed as token frames.

use crate::error::{ApiError, ServerError};
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokstream_interaction::{DEFAULT_TOKEN_DELAY, SyntheticTokenProducer};

pub const HEALTH_PATH: &str = "/health";
pub const SEARCH_PATH: &str = "/api/ai-search";

#[derive(Debug, Clone)]
pub struct AppState {
    /// Pause between emitted frames.
    pub token_delay: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            token_delay: DEFAULT_TOKEN_DELAY,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(SEARCH_PATH, post(search))
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    tracing::info!(addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn search(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let query = latest_user_query(&body)?;
    tracing::debug!(chars = query.chars().count(), "streaming synthetic reply");
    let producer = SyntheticTokenProducer::for_query(&query, state.token_delay);
    Ok(text_stream_response(
        producer.into_stream().map(Ok::<Bytes, Infallible>),
    ))
}

/// Validates a request body and returns the content of its last user
/// message, or an empty string when there is none.
pub fn latest_user_query(body: &[u8]) -> Result<String, ApiError> {
    let body: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::bad_request("Invalid JSON in request body"))?;

    let messages = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request("messages array is required"))?;
    if messages.is_empty() {
        return Err(ApiError::bad_request("messages array cannot be empty"));
    }
    let well_formed = messages
        .iter()
        .all(|m| is_present(m.get("role")) && is_present(m.get("content")));
    if !well_formed {
        return Err(ApiError::bad_request(
            "Each message must have role and content",
        ));
    }

    Ok(messages
        .iter()
        .rev()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("user"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

/// Missing, null, false, zero and the empty string count as absent.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Chunked `text/plain` response for a token frame stream.
pub fn text_stream_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}
