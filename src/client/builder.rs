use crate::client::core::ChatClient;
use crate::config::ClientConfig;
use crate::pipeline::Pipeline;
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Starts from [`ClientConfig::default`]; use [`ChatClientBuilder::from_env`]
/// to pick up `LLM_APIKEY` and the other environment overrides first.
pub struct ChatClientBuilder {
    config: ClientConfig,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(ClientConfig::from_env())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Override the endpoint root, e.g. `http://localhost:8000/v1`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.config.max_tokens = Some(max);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ChatClient> {
        self.config.validate()?;
        let transport = Arc::new(HttpTransport::new(&self.config)?);
        Ok(ChatClient {
            config: self.config,
            transport,
            pipeline: Arc::new(Pipeline::chat_completions()),
        })
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
