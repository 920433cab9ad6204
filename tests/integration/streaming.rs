//! Integration tests for streaming responses

use crate::integration::mock_server::{MockServerFixture, TEST_MODEL};
use futures::StreamExt;
use llm_chat_stream::response::ERROR_PREFIX;
use llm_chat_stream::{HistoryEntry, LlmResponder, Message, StreamingEvent, SYSTEM_PROMPT};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_text_stream_yields_deltas_in_order() {
    let mut fixture = MockServerFixture::new().await;
    let hello = MockServerFixture::delta("Hello");
    let world = MockServerFixture::delta(" World");
    let mock = fixture
        .mock_sse_stream(&[
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
            hello.as_str(),
            world.as_str(),
        ])
        .await;

    let client = fixture.client();
    let chunks: Vec<String> = client
        .text_stream(&[Message::user("hi")])
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(chunks, vec!["Hello", " World"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_stream_reports_finish_reason_and_usage() {
    let mut fixture = MockServerFixture::new().await;
    let answer = MockServerFixture::delta("42");
    let mock = fixture
        .mock_sse_stream(&[
            answer.as_str(),
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            r#"{"choices":[],"usage":{"prompt_tokens":9,"completion_tokens":1,"total_tokens":10}}"#,
        ])
        .await;

    let events: Vec<StreamingEvent> = fixture
        .client()
        .chat_stream(&[Message::user("meaning of life?")])
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamingEvent::ContentDelta {
                content: "42".to_string()
            },
            StreamingEvent::Metadata {
                usage: None,
                finish_reason: Some("stop".to_string()),
            },
            StreamingEvent::Metadata {
                usage: Some(json!({"prompt_tokens":9,"completion_tokens":1,"total_tokens":10})),
                finish_reason: None,
            },
            StreamingEvent::StreamEnd {
                finish_reason: Some("stop".to_string()),
            },
        ]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_collects_whole_answer() {
    let mut fixture = MockServerFixture::new().await;
    let a = MockServerFixture::delta("fn main() ");
    let b = MockServerFixture::delta("{}");
    let _mock = fixture.mock_sse_stream(&[a.as_str(), b.as_str()]).await;

    let answer = fixture
        .client()
        .complete(&[Message::user("smallest rust program")])
        .await
        .unwrap();
    assert_eq!(answer, "fn main() {}");
}

#[tokio::test]
async fn test_responder_sends_formatted_history() {
    let mut fixture = MockServerFixture::new().await;
    let reply = MockServerFixture::delta("Ferris");
    let mock = fixture
        .mock_sse_for_body(
            json!({
                "model": TEST_MODEL,
                "stream": true,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "what is rust's mascot?"},
                    {"role": "assistant", "content": "a crab"},
                    {"role": "user", "content": "its name?"}
                ]
            }),
            &[reply.as_str()],
        )
        .await;

    let history = vec![
        HistoryEntry::user("what is rust's mascot?"),
        HistoryEntry::new("system", "dropped"),
        HistoryEntry::assistant("a crab"),
    ];
    let responder = LlmResponder::new(fixture.client());
    let chunks: Vec<String> = responder
        .respond("its name?", Some(history.as_slice()))
        .collect()
        .await;

    assert_eq!(chunks, vec!["Ferris"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_responder_without_history_sends_system_and_user_only() {
    let mut fixture = MockServerFixture::new().await;
    let reply = MockServerFixture::delta("hello");
    let mock = fixture
        .mock_sse_for_body(
            json!({
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "hi"}
                ]
            }),
            &[reply.as_str()],
        )
        .await;

    let chunks: Vec<String> = LlmResponder::new(fixture.client())
        .respond("hi", None)
        .collect()
        .await;

    assert_eq!(chunks, vec!["hello"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_slow_stream_outlives_client_timeout() {
    let mut fixture = MockServerFixture::new().await;
    let words: Vec<String> = (0..5)
        .map(|i| MockServerFixture::delta(&format!("w{i} ")))
        .collect();
    let _mock = fixture
        .mock_paced_sse_stream(words, Duration::from_millis(400), true)
        .await;

    let client = fixture.client_with_timeout(Duration::from_secs(1));
    let chunks: Vec<String> = LlmResponder::new(client)
        .respond("count slowly", None)
        .collect()
        .await;

    assert!(chunks.iter().all(|c| !c.starts_with(ERROR_PREFIX)), "{chunks:?}");
    assert_eq!(chunks.concat(), "w0 w1 w2 w3 w4 ");
}
