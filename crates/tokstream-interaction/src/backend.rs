use crate::error::BackendError;
use crate::request::ChatRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Response body as the transport delivers it: byte chunks of arbitrary
/// size, or an error that ends the stream.
pub type ByteStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// A source of token-framed response bodies.
///
/// Implementations only open the stream; decoding belongs to the caller.
/// Dropping the returned stream closes the underlying byte source.
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Sends `request` and returns the response body stream.
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, BackendError>;
}
