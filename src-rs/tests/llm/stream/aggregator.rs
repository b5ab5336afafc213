use crate::cons::provider_cons::LLMProvider;
use crate::error::ReviewError;
use crate::llm::stream::{StreamAggregator, StreamBuffer};
use anyhow::anyhow;
use serde_json::{json, Value};

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_chunks(chunks: Vec<Value>) -> impl tokio_stream::Stream<Item = anyhow::Result<Value>> + Unpin {
        tokio_stream::iter(chunks.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn openai_fragments_concatenate_in_order() {
        let chunks = vec![
            json!({ "choices": [ { "delta": { "role": "assistant" } } ] }),
            json!({ "choices": [ { "delta": { "content": "Hel" } } ] }),
            json!({ "choices": [ { "delta": { "content": "lo" } } ] }),
            json!({ "choices": [ { "delta": { "content": " world" } } ] }),
        ];
        let mut renders: Vec<String> = Vec::new();
        let mut sink = |text: &str| renders.push(text.to_string());

        let buffer = StreamAggregator::new(LLMProvider::OpenAI)
            .aggregate(ok_chunks(chunks), &mut sink, StreamBuffer::for_index(0))
            .await
            .expect("aggregate");

        assert_eq!(buffer.key(), "ai_comment_0");
        assert_eq!(buffer.as_str(), "Hello world");
        assert_eq!(renders, vec!["", "Hel", "Hello", "Hello world"]);
    }

    #[tokio::test]
    async fn claude_events_stop_at_message_delta() {
        let chunks = vec![
            json!({ "type": "message_start", "message": { "id": "msg_1" } }),
            json!({ "type": "content_block_start", "index": 0 }),
            json!({ "type": "content_block_delta", "delta": { "text": "Looks " } }),
            json!({ "type": "content_block_delta", "delta": { "text": "good." } }),
            json!({ "type": "message_delta", "delta": { "stop_reason": "end_turn" } }),
            json!({ "type": "content_block_delta", "delta": { "text": "never seen" } }),
        ];
        let mut renders: Vec<String> = Vec::new();
        let mut sink = |text: &str| renders.push(text.to_string());

        let buffer = StreamAggregator::new(LLMProvider::Claude)
            .aggregate(ok_chunks(chunks), &mut sink, StreamBuffer::for_index(2))
            .await
            .expect("aggregate");

        assert_eq!(buffer.as_str(), "Looks good.");
        // One render per processed non-stop chunk, always the full text.
        assert_eq!(renders, vec!["", "", "Looks ", "Looks good."]);
    }

    #[tokio::test]
    async fn claude_legacy_chunks_run_until_exhausted() {
        let chunks = vec![json!({ "text": "a" }), json!({ "text": "b" }), json!({ "text": "c" })];
        let mut calls = 0usize;
        let mut sink = |_: &str| calls += 1;

        let buffer = StreamAggregator::new(LLMProvider::Claude)
            .aggregate(ok_chunks(chunks), &mut sink, StreamBuffer::new("k"))
            .await
            .expect("aggregate");

        assert_eq!(buffer.into_string(), "abc");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn empty_sequence_yields_empty_buffer_without_renders() {
        let mut calls = 0usize;
        let mut sink = |_: &str| calls += 1;

        let buffer = StreamAggregator::new(LLMProvider::OpenAI)
            .aggregate(ok_chunks(Vec::new()), &mut sink, StreamBuffer::new("k"))
            .await
            .expect("aggregate");

        assert!(buffer.is_empty());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn generic_malformed_chunk_aborts_stream() {
        let chunks = vec![
            json!({ "message": { "content": "part" }, "done": false }),
            json!({ "done": false }),
            json!({ "message": { "content": "more" }, "done": false }),
        ];
        let mut renders: Vec<String> = Vec::new();
        let mut sink = |text: &str| renders.push(text.to_string());

        let err = StreamAggregator::new(LLMProvider::Generic)
            .aggregate(ok_chunks(chunks), &mut sink, StreamBuffer::new("k"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, ReviewError::MalformedChunk { .. }));
        assert_eq!(renders, vec!["part"]);
    }

    #[tokio::test]
    async fn transport_error_keeps_partial_text() {
        let items: Vec<anyhow::Result<Value>> = vec![
            Ok(json!({ "choices": [ { "delta": { "content": "half " } } ] })),
            Ok(json!({ "choices": [ { "delta": { "content": "done" } } ] })),
            Err(anyhow!("connection reset")),
            Ok(json!({ "choices": [ { "delta": { "content": "lost" } } ] })),
        ];
        let mut sink = |_: &str| {};

        let err = StreamAggregator::new(LLMProvider::OpenAI)
            .aggregate(tokio_stream::iter(items), &mut sink, StreamBuffer::new("k"))
            .await
            .expect_err("should fail");

        assert_eq!(err.partial_text(), Some("half done"));
        match err {
            ReviewError::StreamInterrupted { received, .. } => assert_eq!(received, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
