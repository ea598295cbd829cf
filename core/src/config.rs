use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_ENV_VAR: &str = "RAGKIT_GEMINI_MODEL";
pub const EMBEDDING_MODEL_ENV_VAR: &str = "RAGKIT_EMBEDDING_MODEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to fetch env var `{0}`")]
    MissingEnvVar(String),
    #[error("Failed to deserialize json config: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Connection settings for the Gemini API.
///
/// Providers are built from this struct and never look at the process
/// environment themselves; [`GeminiConfig::from_env`] is there for the
/// application to call.
///
/// ```json
/// {
///     "api_key": "...",
///     "model": "gemini-2.0-flash",
///     "embedding_model": "text-embedding-004",
///     "timeout_ms": 30000
/// }
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Per request timeout in milliseconds, no timeout when unset or zero
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: default_api_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            timeout_ms: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the key from `GOOGLE_API_KEY`, and the model names from
    /// `RAGKIT_GEMINI_MODEL` and `RAGKIT_EMBEDDING_MODEL` when they're set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV_VAR)
            .map_err(|_| ConfigError::MissingEnvVar(API_KEY_ENV_VAR.to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
            config.model = model;
        }
        if let Ok(model) = std::env::var(EMBEDDING_MODEL_ENV_VAR) {
            config.embedding_model = model;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// A zero `timeout` removes the limit, anything shorter than a
    /// millisecond is rounded up to one.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = if timeout.is_zero() {
            None
        } else {
            Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1))
        };
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// URL of a model method, eg. `models/gemini-2.0-flash:generateContent`
    pub(crate) fn method_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.api_url.trim_end_matches('/'))
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
