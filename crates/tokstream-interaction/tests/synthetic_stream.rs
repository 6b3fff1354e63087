use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tokstream_core::{TokenPipeline, TrailingLinePolicy, reassemble};
use tokstream_interaction::{ChatRequest, SyntheticBackend, TokenBackend, canned_reply};

async fn collect_body(backend: &SyntheticBackend, query: &str) -> Vec<u8> {
    let mut stream = backend
        .open(&ChatRequest::from_query(query))
        .await
        .unwrap();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    body
}

#[tokio::test]
async fn test_synthetic_backend_reassembles_canned_reply() {
    let backend = SyntheticBackend::new(Duration::ZERO);
    let query = "What is TypeScript?";

    let mut stream = backend.open(&ChatRequest::from_query(query)).await.unwrap();
    let mut pipeline = TokenPipeline::default();
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.unwrap();
        text.extend(pipeline.feed(&chunk));
    }
    text.extend(pipeline.finish());

    assert_eq!(text, canned_reply(query));
    assert_eq!(pipeline.stats().tokens, canned_reply(query).chars().count());
    assert_eq!(pipeline.stats().dropped(), 0);
}

#[tokio::test]
async fn test_rechunked_body_reassembles_identically() {
    let reply = "héllo ※ wörld…\n\"quoted\"";
    let backend = SyntheticBackend::with_reply(reply, Duration::ZERO);
    let body = collect_body(&backend, "ignored").await;

    for size in [1, 2, 3, 5, 7, 64, body.len()] {
        let acc = reassemble(body.chunks(size), TrailingLinePolicy::Flush);
        assert_eq!(acc.as_str(), reply, "chunk size {size}");
    }
}

#[tokio::test]
async fn test_latest_user_message_selects_reply() {
    let backend = SyntheticBackend::new(Duration::ZERO);
    let history = vec![
        tokstream_core::Message::user("tell me about react"),
        tokstream_core::Message::assistant("..."),
        tokstream_core::Message::user("and next.js?"),
    ];

    let mut stream = backend
        .open(&ChatRequest::from_history(&history))
        .await
        .unwrap();
    let mut chunks = Vec::new();
    while let Some(chunk) = stream.next().await {
        chunks.push(chunk.unwrap());
    }

    let acc = reassemble(&chunks, TrailingLinePolicy::Discard);
    assert_eq!(acc.as_str(), canned_reply("next"));
}
