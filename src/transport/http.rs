use crate::config::ClientConfig;
use crate::{BoxStream, Result};
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Proxy;
use std::time::Duration;
use tracing::warn;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            // `timeout` bounds connect, response headers and each body gap, never the whole stream.
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            // Conservative HTTP/2 keepalive defaults for long-lived streams.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = proxy_url.as_str(), error = %e, "ignoring invalid proxy URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Limit applied to connecting, to waiting for response headers and to
    /// each gap between body chunks.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `request_body` to `path` and return the response without reading its body.
    pub async fn execute_stream_response(
        &self,
        path: &str,
        request_body: &serde_json::Value,
        client_request_id: Option<&str>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(request_body);

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        req = req.header("accept", "text/event-stream");
        if let Some(id) = client_request_id {
            req = req.header("x-request-id", id);
        }

        match tokio::time::timeout(self.timeout, req.send()).await {
            Ok(sent) => sent.map_err(|e| crate::Error::Transport(TransportError::Http(e))),
            Err(_) => Err(crate::Error::Transport(TransportError::Timeout(format!(
                "no response headers within {:?}",
                self.timeout
            )))),
        }
    }

    /// Body of `resp` as a byte stream that fails once no chunk arrives for `idle`.
    pub fn body_stream(resp: reqwest::Response, idle: Duration) -> BoxStream<'static, Bytes> {
        let body: BoxStream<'static, Bytes> = Box::pin(
            resp.bytes_stream()
                .map_err(|e| crate::Error::Transport(TransportError::Http(e))),
        );
        with_idle_timeout(body, idle)
    }
}

/// End `input` with a timeout error when it stalls for longer than `idle`.
pub fn with_idle_timeout(
    input: BoxStream<'static, Bytes>,
    idle: Duration,
) -> BoxStream<'static, Bytes> {
    let stream = stream::unfold(Some(input), move |state| async move {
        let mut input = state?;
        match tokio::time::timeout(idle, input.next()).await {
            Ok(Some(item)) => Some((item, Some(input))),
            Ok(None) => None,
            Err(_) => Some((
                Err(crate::Error::Transport(TransportError::Timeout(format!(
                    "no data received for {:?}",
                    idle
                )))),
                None,
            )),
        }
    });
    Box::pin(stream)
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Other(String),
}
