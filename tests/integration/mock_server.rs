//! Mock HTTP server setup for integration tests

use llm_chat_stream::{ChatClient, ChatClientBuilder};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::io::Write;
use std::time::Duration;

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const TEST_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "test-model";

/// Test fixture that owns a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = format!("{}/v1", server.url());
        Self { server, base_url }
    }

    /// Client pointed at the mock server
    pub fn client(&self) -> ChatClient {
        ChatClientBuilder::new()
            .api_key(TEST_KEY)
            .model(TEST_MODEL)
            .base_url(&self.base_url)
            .build()
            .expect("client should build")
    }

    /// Client pointed at the mock server with a short timeout
    pub fn client_with_timeout(&self, timeout: Duration) -> ChatClient {
        ChatClientBuilder::new()
            .api_key(TEST_KEY)
            .model(TEST_MODEL)
            .base_url(&self.base_url)
            .timeout(timeout)
            .build()
            .expect("client should build")
    }

    /// Build an SSE body from JSON payloads, terminated by `[DONE]`.
    pub fn sse_body(chunks: &[&str]) -> String {
        let mut body: String = chunks
            .iter()
            .map(|chunk| format!("data: {}\n\n", chunk))
            .collect();
        body.push_str("data: [DONE]\n\n");
        body
    }

    /// SSE payload for a single content delta.
    pub fn delta(content: &str) -> String {
        serde_json::json!({
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
        .to_string()
    }

    /// Successful streaming response (SSE) for any authorized request
    pub async fn mock_sse_stream(&mut self, chunks: &[&str]) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .match_header("authorization", format!("Bearer {}", TEST_KEY).as_str())
            .match_header("accept", "text/event-stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(Self::sse_body(chunks))
            .create_async()
            .await
    }

    /// Successful streaming response that only matches the given request body
    pub async fn mock_sse_for_body(&mut self, body: serde_json::Value, chunks: &[&str]) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .match_body(Matcher::PartialJson(body))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(Self::sse_body(chunks))
            .create_async()
            .await
    }

    /// SSE response written frame by frame, sleeping `gap` before each one.
    /// The `[DONE]` frame is only sent when `finish` is set.
    pub async fn mock_paced_sse_stream(
        &mut self,
        chunks: Vec<String>,
        gap: Duration,
        finish: bool,
    ) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(move |w| {
                for chunk in &chunks {
                    std::thread::sleep(gap);
                    w.write_all(format!("data: {}\n\n", chunk).as_bytes())?;
                    w.flush()?;
                }
                if finish {
                    w.write_all(b"data: [DONE]\n\n")?;
                }
                Ok(())
            })
            .create_async()
            .await
    }

    /// Error response with a JSON body
    pub async fn mock_error_response(&mut self, status: usize, error_body: &str) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body)
            .create_async()
            .await
    }
}
