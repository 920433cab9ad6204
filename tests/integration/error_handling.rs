//! Integration tests for error handling

use crate::integration::mock_server::{MockServerFixture, TEST_KEY};
use futures::StreamExt;
use llm_chat_stream::response::ERROR_PREFIX;
use llm_chat_stream::{ChatClientBuilder, Error, LlmResponder, Message};
use std::time::Duration;

#[tokio::test]
async fn test_unauthorized_maps_to_remote_error() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(
            401,
            r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#,
        )
        .await;

    let err = fixture
        .client()
        .chat_stream(&[Message::user("hi")])
        .await
        .err()
        .expect("request should fail");

    match err {
        Error::Remote {
            status,
            class,
            message,
            retryable,
            ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(class, "authentication");
            assert_eq!(message, "Invalid API key");
            assert!(!retryable);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", crate::integration::mock_server::CHAT_PATH)
        .with_status(429)
        .with_header("retry-after", "3")
        .with_body(r#"{"error":{"message":"Too many requests"}}"#)
        .create_async()
        .await;

    let err = fixture
        .client()
        .chat_stream(&[Message::user("hi")])
        .await
        .err()
        .expect("request should fail");

    assert!(err.is_retryable());
    match err {
        Error::Remote {
            class,
            retry_after_ms,
            ..
        } => {
            assert_eq!(class, "rate_limited");
            assert_eq!(retry_after_ms, Some(3000));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_responder_folds_http_error_into_chunk() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(500, r#"{"error":{"message":"upstream exploded"}}"#)
        .await;

    let chunks: Vec<String> = LlmResponder::new(fixture.client())
        .respond("hi", None)
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec!["An error occurred: Remote error: HTTP 500 (server_error): upstream exploded"]
    );
}

#[tokio::test]
async fn test_responder_keeps_partial_answer_before_in_band_error() {
    let mut fixture = MockServerFixture::new().await;
    let partial = MockServerFixture::delta("Part");
    let _mock = fixture
        .mock_sse_stream(&[
            partial.as_str(),
            r#"{"error":{"message":"model crashed","type":"server_error"}}"#,
        ])
        .await;

    let chunks: Vec<String> = LlmResponder::new(fixture.client())
        .respond("hi", None)
        .collect()
        .await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], "Part");
    assert!(chunks[1].starts_with(ERROR_PREFIX));
    assert!(chunks[1].contains("model crashed"));
}

#[tokio::test]
async fn test_responder_reports_connection_failure() {
    // Nothing listens on port 1.
    let client = ChatClientBuilder::new()
        .api_key(TEST_KEY)
        .base_url("http://127.0.0.1:1/v1")
        .build()
        .unwrap();

    let chunks: Vec<String> = LlmResponder::new(client).respond("hi", None).collect().await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].starts_with("An error occurred: Network transport error:"));
}

#[tokio::test]
async fn test_empty_error_body_falls_back_to_reason_phrase() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_error_response(503, "").await;

    let err = fixture
        .client()
        .chat_stream(&[Message::user("hi")])
        .await
        .err()
        .expect("request should fail");

    match err {
        Error::Remote {
            status, message, ..
        } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_stalled_stream_ends_with_timeout_chunk() {
    let mut fixture = MockServerFixture::new().await;
    let first = MockServerFixture::delta("first");
    let _mock = fixture
        .mock_paced_sse_stream(vec![first], Duration::from_secs(2), false)
        .await;

    let client = fixture.client_with_timeout(Duration::from_millis(500));
    let chunks: Vec<String> = LlmResponder::new(client).respond("hi", None).collect().await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].starts_with(ERROR_PREFIX));
    assert!(chunks[0].contains("Timed out"), "{}", chunks[0]);
}
