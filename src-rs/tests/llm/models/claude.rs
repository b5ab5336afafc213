use crate::llm::models::claude::{claude_event_stream, unwrap_event_data};
use crate::llm::models::openai::FrameStream;
use anyhow::Result;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(items: &[&str]) -> FrameStream {
        let owned: Vec<Result<String>> = items.iter().map(|s| Ok(s.to_string())).collect();
        Box::pin(tokio_stream::iter(owned))
    }

    async fn collect(items: &[&str]) -> Vec<Result<Value>> {
        claude_event_stream(frames(items)).collect().await
    }

    #[test]
    fn unwrap_event_data_passes_plain_events_through() {
        let v = json!({ "type": "content_block_delta", "delta": { "text": "x" } });
        assert_eq!(unwrap_event_data(&v), Some(v.clone()));

        let legacy = json!({ "text": "x" });
        assert_eq!(unwrap_event_data(&legacy), Some(legacy.clone()));
    }

    #[test]
    fn unwrap_event_data_unwraps_object_data() {
        let v = json!({ "data": { "type": "message_stop" } });
        let unwrapped = unwrap_event_data(&v).expect("should unwrap");
        assert_eq!(unwrapped["type"], "message_stop");
    }

    #[test]
    fn unwrap_event_data_unwraps_string_data() {
        let v = json!({ "data": "{\"type\":\"message_start\"}" });
        let unwrapped = unwrap_event_data(&v).expect("should unwrap");
        assert_eq!(unwrapped["type"], "message_start");
    }

    #[test]
    fn unwrap_event_data_rejects_unrelated_shapes() {
        assert!(unwrap_event_data(&json!({ "foo": 1 })).is_none());
        assert!(unwrap_event_data(&json!({ "data": "not json" })).is_none());
    }

    #[tokio::test]
    async fn event_stream_turns_error_event_into_err_and_stops() {
        let items = collect(&[
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"Hi"}}"#,
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"late"}}"#,
        ])
        .await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        let err = items[1].as_ref().expect_err("error event");
        let msg = err.to_string();
        assert!(msg.contains("overloaded_error"));
        assert!(msg.contains("Overloaded"));
    }

    #[tokio::test]
    async fn event_stream_yields_message_stop_then_ends() {
        let items = collect(&[
            r#"{"type":"message_start","message":{}}"#,
            r#"{"type":"message_stop"}"#,
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"late"}}"#,
        ])
        .await;

        assert_eq!(items.len(), 2);
        let last = items[1].as_ref().expect("message_stop");
        assert_eq!(last["type"], "message_stop");
    }

    #[tokio::test]
    async fn event_stream_skips_unparseable_payloads() {
        let items = collect(&[
            "{truncated",
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"ok"}}"#,
            "also not json",
        ])
        .await;

        assert_eq!(items.len(), 1);
        let only = items[0].as_ref().expect("event");
        assert_eq!(only["delta"]["text"], "ok");
    }

    #[tokio::test]
    async fn event_stream_unwraps_nested_data() {
        let items = collect(&[r#"{"data":{"type":"message_stop"}}"#]).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().expect("event")["type"], "message_stop");
    }
}
