use tokstream_core::protocol::{FrameDecoder, TokenFrameParser, encode_token_frame, frames};
use tokstream_core::{
    ConversationStore, Message, SessionStatus, StreamSession, TokenPipeline, TrailingLinePolicy,
    reassemble,
};

const REPLIES: &[&str] = &[
    "AB",
    "Next.js is a React framework.\n\n1. **App Router**\n2. \"Server\" Components",
    "こんにちは！これはテストです。",
    "mixed: café, naïve, 🦀 crab, tab\there, back\\slash",
    "",
];

fn wire(reply: &str) -> Vec<u8> {
    reply
        .chars()
        .map(|c| encode_token_frame(c.encode_utf8(&mut [0; 4])))
        .collect::<String>()
        .into_bytes()
}

fn with_line_inserted(reply: &str, line: &str, at_frame: usize) -> Vec<u8> {
    let mut frames: Vec<String> = reply
        .chars()
        .map(|c| encode_token_frame(&c.to_string()))
        .collect();
    let at = at_frame.min(frames.len());
    frames.insert(at, format!("{line}\n"));
    frames.concat().into_bytes()
}

#[test]
fn test_reassembles_single_chunk() {
    for reply in REPLIES {
        let bytes = wire(reply);
        let acc = reassemble([bytes.as_slice()], TrailingLinePolicy::Flush);
        assert_eq!(acc.as_str(), *reply);
        assert_eq!(acc.token_count(), reply.chars().count());
    }
}

#[test]
fn test_every_split_offset_yields_same_result() {
    for reply in REPLIES {
        let bytes = wire(reply);
        for split in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(split);
            let acc = reassemble([head, tail], TrailingLinePolicy::Flush);
            assert_eq!(acc.as_str(), *reply, "split at byte {split}");
        }
    }
}

#[test]
fn test_every_pair_of_split_offsets_yields_same_result() {
    let reply = "é\n\"🦀\"";
    let bytes = wire(reply);
    for first in 0..=bytes.len() {
        for second in first..=bytes.len() {
            let chunks = [&bytes[..first], &bytes[first..second], &bytes[second..]];
            let acc = reassemble(chunks, TrailingLinePolicy::Discard);
            assert_eq!(acc.as_str(), reply, "splits at {first},{second}");
        }
    }
}

#[test]
fn test_byte_at_a_time_delivery() {
    for reply in REPLIES {
        let bytes = wire(reply);
        let acc = reassemble(bytes.chunks(1), TrailingLinePolicy::Flush);
        assert_eq!(acc.as_str(), *reply);
    }
}

#[test]
fn test_malformed_token_frames_are_dropped() {
    let reply = REPLIES[1];
    for bad in ["0:not-json", "0:123", "0:{\"a\":1}", "0:"] {
        for at in [0, 3, reply.chars().count()] {
            let bytes = with_line_inserted(reply, bad, at);
            for split in (0..=bytes.len()).step_by(7) {
                let (head, tail) = bytes.split_at(split);
                let acc = reassemble([head, tail], TrailingLinePolicy::Flush);
                assert_eq!(acc.as_str(), reply, "{bad} at frame {at}, split {split}");
            }
        }
    }
}

#[test]
fn test_unknown_sentinels_are_ignored() {
    let reply = REPLIES[2];
    for at in 0..=reply.chars().count() {
        let bytes = with_line_inserted(reply, "1:\"ignored\"", at);
        let acc = reassemble([bytes.as_slice()], TrailingLinePolicy::Flush);
        assert_eq!(acc.as_str(), reply);
    }
}

#[test]
fn test_concrete_two_chunk_scenario() {
    let chunks: [&[u8]; 2] = [b"0:\"A\"\n0:", b"\"B\"\n"];

    let lines: Vec<String> = frames(chunks, TrailingLinePolicy::Flush).collect();
    assert_eq!(lines, vec!["0:\"A\"", "0:\"B\""]);

    let mut parser = TokenFrameParser::new();
    let tokens: Vec<String> = lines.iter().filter_map(|l| parser.parse(l)).collect();
    assert_eq!(tokens, vec!["A", "B"]);

    assert_eq!(reassemble(chunks, TrailingLinePolicy::Flush).as_str(), "AB");
}

#[test]
fn test_decoder_never_yields_partial_characters() {
    let text = "日本語テキスト\n";
    let bytes = text.as_bytes();
    for split in 0..=bytes.len() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&bytes[..split]);
        let early = decoder.next_line();
        decoder.push(&bytes[split..]);
        let line = early.or_else(|| decoder.next_line());
        assert_eq!(line.as_deref(), Some("日本語テキスト"));
    }
}

#[tokio::test]
async fn test_completed_session_appends_one_assistant_message() {
    let store = ConversationStore::new();
    store.append(Message::user("earlier")).await;
    store.append(Message::assistant("earlier answer")).await;

    let reply = REPLIES[3];
    let mut session = StreamSession::new("What is this?");
    store.append(Message::user(session.query())).await;

    let mut pipeline = TokenPipeline::new(TrailingLinePolicy::Flush);
    for chunk in wire(reply).chunks(5) {
        for token in pipeline.feed(chunk) {
            session.push_token(&token).unwrap();
        }
    }
    for token in pipeline.finish() {
        session.push_token(&token).unwrap();
    }
    store.materialize(&mut session).await.unwrap();

    let history = store.snapshot().await;
    assert_eq!(history.len(), 4);
    assert!(history[2].is_user());
    assert_eq!(history[2].content, "What is this?");
    assert!(history[3].is_assistant());
    assert_eq!(history[3].content, session.accumulated());
    assert_eq!(session.status(), SessionStatus::Complete);
}

#[test]
fn test_cancellation_keeps_exactly_the_folded_tokens() {
    let reply = "streaming answer";
    let bytes = wire(reply);
    let cancel_after = 6;

    let mut session = StreamSession::new("q");
    let mut pipeline = TokenPipeline::default();
    'outer: for chunk in bytes.chunks(3) {
        for token in pipeline.feed(chunk) {
            session.push_token(&token).unwrap();
            if session.token_count() == cancel_after {
                session.cancel("caller went away").unwrap();
                break 'outer;
            }
        }
    }

    assert_eq!(session.status(), SessionStatus::Failed);
    assert!(session.is_cancelled());
    assert_eq!(session.accumulated(), "stream");
}
