//! Client configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults ([`DEFAULT_MODEL`], [`DEFAULT_BASE_URL`], 30 s timeout)
//! 2. an optional YAML file ([`ClientConfig::from_yaml_file`])
//! 3. environment variables, after loading a `.env` file if one exists
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LLM_APIKEY` | `api_key` |
//! | `LLM_MODEL` | `model` |
//! | `LLM_BASE_URL` | `base_url` |
//! | `LLM_HTTP_TIMEOUT_SECS` | `timeout` |
//! | `LLM_PROXY_URL` | `proxy_url` |

use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "Qwen2.5-Coder-32B-Instruct";
pub const DEFAULT_BASE_URL: &str = "https://llm-api.cyverse.ai/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_KEY_ENV: &str = "LLM_APIKEY";
const KEYRING_SERVICE: &str = "llm-chat-stream";
const KEYRING_USER: &str = "default";

/// Resolved settings for a [`crate::ChatClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub proxy_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy_url: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// On-disk YAML shape. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    proxy_url: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl ClientConfig {
    /// Defaults overlaid with the process environment (and `.env`).
    pub fn from_env() -> Self {
        load_dotenv();
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load a YAML config file, then apply environment overrides.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        load_dotenv();
        Ok(Self::from_yaml_str(&raw)?.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse YAML config text on top of the defaults. No environment lookup.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(raw)?;
        let mut cfg = Self::default();
        if let Some(model) = file.model {
            cfg.model = model;
        }
        if let Some(base_url) = file.base_url {
            cfg.base_url = base_url;
        }
        if let Some(secs) = file.timeout_secs {
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg.api_key = file.api_key.or(cfg.api_key);
        cfg.proxy_url = file.proxy_url.or(cfg.proxy_url);
        cfg.temperature = file.temperature.or(cfg.temperature);
        cfg.max_tokens = file.max_tokens.or(cfg.max_tokens);
        Ok(cfg)
    }

    /// Apply env-style overrides from `lookup`.
    ///
    /// The API key from `LLM_APIKEY` only fills a key that is still missing;
    /// the remaining variables replace what is configured. Numeric values that
    /// fail to parse are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = non_empty(API_KEY_ENV);
        }
        if let Some(model) = non_empty("LLM_MODEL") {
            self.model = model;
        }
        if let Some(base_url) = non_empty("LLM_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(secs) =
            non_empty("LLM_HTTP_TIMEOUT_SECS").and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(proxy) = non_empty("LLM_PROXY_URL") {
            self.proxy_url = Some(proxy);
        }
        self
    }

    /// Check the settings before any connection is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new()
                    .with_field_path("config.model")
                    .with_source("client_config"),
            ));
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                "base URL is not a valid absolute URL",
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(format!("{}: {}", self.base_url, e))
                    .with_source("client_config"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "base URL must use http or https",
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(format!("scheme: {}", parsed.scheme()))
                    .with_source("client_config"),
            ));
        }

        if self.timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new()
                    .with_field_path("config.timeout")
                    .with_source("client_config"),
            ));
        }
        Ok(())
    }

    /// The configured key, falling back to the OS keyring.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }

        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
        match entry.get_password() {
            Ok(key) => Some(key),
            Err(e) => {
                debug!(error = %e, "no API key in keyring");
                None
            }
        }
    }
}

fn load_dotenv() {
    // A missing .env file is the common case.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            debug!(error = %e, "failed to load .env file");
        }
    }
}
