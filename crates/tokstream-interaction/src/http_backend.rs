//! HttpBackend - streams token frames from a remote HTTP endpoint.
//!
//! The endpoint receives the request as JSON and answers with a chunked
//! `text/plain` body in the token frame protocol. Errors are reported either
//! through a non-2xx status or through a `{"error": "..."}` JSON body.

use crate::backend::{ByteStream, TokenBackend};
use crate::error::BackendError;
use crate::request::ChatRequest;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, header};
use serde_json::Value;

/// Backend that POSTs to a remote endpoint.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                BackendError::transport(format!("request to {} failed: {err}", self.endpoint))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| body.trim().to_string());
            tracing::warn!(status = status.as_u16(), %message, "backend returned error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            let body = response
                .text()
                .await
                .map_err(|err| BackendError::transport(format!("failed to read body: {err}")))?;
            let message = error_message(&body).unwrap_or_else(|| body.trim().to_string());
            return Err(BackendError::Remote(message));
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|err| BackendError::transport(format!("stream error: {err}")))
        });
        Ok(stream.boxed())
    }
}

/// Extracts `error` from a `{"error": "..."}` body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_reads_error_field() {
        assert_eq!(
            error_message(r#"{"error":"messages array is required"}"#).as_deref(),
            Some("messages array is required")
        );
        assert_eq!(error_message(r#"{"detail":"nope"}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let backend = HttpBackend::new("http://127.0.0.1:9/api/ai-search");
        let err = match backend.open(&ChatRequest::from_query("hi")).await {
            Ok(_) => panic!("expected connection failure"),
            Err(err) => err,
        };
        assert!(err.is_transport());
    }
}
