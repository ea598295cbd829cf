pub(crate) mod chat;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chat::ChatSession;

/// Message that'll be sent in Completions
///
/// Serializes as `{"role": "user", "content": "..."}`, so a history can be
/// saved to JSON and loaded back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    /// System prompt
    Preamble(String),
    /// Message sent by the user
    User(String),
    /// Response from the assistant
    Assistant(String),
}

pub type MessageHistory = Vec<Message>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl TokenUsage {
    /// Adds `other` onto `self`, a count missing on one side keeps the other's.
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens = combine_options(self.prompt_tokens, other.prompt_tokens);
        self.completion_tokens = combine_options(self.completion_tokens, other.completion_tokens);
        self.total_tokens = combine_options(self.total_tokens, other.total_tokens);
    }
}

/// Reply of a completion model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub token_usage: TokenUsage,
    /// Why the model stopped, as reported by the provider (eg. `STOP`, `MAX_TOKENS`)
    pub finish_reason: Option<String>,
}

/// Sampling parameters, unset fields fall back to the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl GenerationConfig {
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    #[must_use]
    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    #[must_use]
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    #[must_use]
    pub fn stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }

    /// Checks the parameters are in the ranges the API accepts.
    pub fn validate(&self) -> Result<(), CompletionError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(CompletionError::InvalidConfig(format!(
                    "temperature must be within [0, 2], got {t}"
                )));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(CompletionError::InvalidConfig(format!(
                    "top_p must be within [0, 1], got {p}"
                )));
            }
        }
        if self.top_k == Some(0) {
            return Err(CompletionError::InvalidConfig(
                "top_k must be greater than 0".to_string(),
            ));
        }
        if self.max_output_tokens == Some(0) {
            return Err(CompletionError::InvalidConfig(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Provider error -> HTTP Status {0}: {1}")]
    ProviderError(u16, String),
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("Prompt was blocked: {0}")]
    Blocked(String),
    #[error("Invalid generation config: {0}")]
    InvalidConfig(String),
}

/// Text fragments of a streamed reply, in generation order.
///
/// The stream ends when the reply is complete, dropping it early cancels
/// the request.
pub type TextStream = BoxStream<'static, Result<String, CompletionError>>;

#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send message to LLM and get a reply
    async fn send(
        &self,
        message: Message,
        history: &[Message],
        config: &GenerationConfig,
    ) -> Result<GenerationResult, CompletionError>;

    /// Send message to LLM and get the reply as it gets generated
    async fn stream(
        &self,
        message: Message,
        history: &[Message],
        config: &GenerationConfig,
    ) -> Result<TextStream, CompletionError>;

    /// Single prompt without any history
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult, CompletionError> {
        self.send(Message::User(prompt.to_string()), &[], config)
            .await
    }
}

fn combine_options(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a_val), Some(b_val)) => Some(a_val + b_val),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_accumulates() {
        let mut total = TokenUsage::default();
        total.accumulate(&TokenUsage {
            prompt_tokens: Some(10),
            completion_tokens: Some(5),
            total_tokens: Some(15),
        });
        total.accumulate(&TokenUsage {
            prompt_tokens: Some(3),
            completion_tokens: None,
            total_tokens: Some(3),
        });
        assert_eq!(
            total,
            TokenUsage {
                prompt_tokens: Some(13),
                completion_tokens: Some(5),
                total_tokens: Some(18),
            }
        );
    }

    #[test]
    fn messages_serialize_with_their_role() {
        let history = vec![
            Message::Preamble("be brief".to_string()),
            Message::User("hi".to_string()),
            Message::Assistant("hello".to_string()),
        ];
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "preamble", "content": "be brief"},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"},
            ])
        );
        let parsed: MessageHistory = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn config_validation() {
        assert!(GenerationConfig::default().validate().is_ok());
        assert!(GenerationConfig::default()
            .temperature(0.7)
            .top_p(0.9)
            .top_k(40)
            .max_output_tokens(200)
            .validate()
            .is_ok());
        assert!(matches!(
            GenerationConfig::default().temperature(2.5).validate(),
            Err(CompletionError::InvalidConfig(_))
        ));
        assert!(GenerationConfig::default().top_p(1.5).validate().is_err());
        assert!(GenerationConfig::default().top_k(0).validate().is_err());
        assert!(GenerationConfig::default()
            .max_output_tokens(0)
            .validate()
            .is_err());
    }

    #[test]
    fn config_serializes_to_camel_case_and_skips_unset() {
        let config = GenerationConfig::default()
            .temperature(0.1)
            .max_output_tokens(50);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"temperature": 0.1, "maxOutputTokens": 50})
        );
        let parsed: GenerationConfig =
            serde_json::from_str(r#"{"topP": 0.5, "stopSequences": ["END"]}"#).unwrap();
        assert_eq!(parsed.top_p, Some(0.5));
        assert_eq!(parsed.stop_sequences, vec!["END".to_string()]);
    }
}
