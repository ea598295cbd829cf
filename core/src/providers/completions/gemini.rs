use crate::completion::{
    CompletionError, CompletionModel, GenerationConfig, GenerationResult, Message, TextStream,
    TokenUsage,
};
use crate::config::{ConfigError, GeminiConfig};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, error, info, instrument, warn};

/// Implementation of the `CompletionModel` trait for Google's Gemini API.
///
/// ```rust,no_run
/// use ragkit::{completion::{CompletionModel, GenerationConfig}, config::GeminiConfig};
/// use ragkit::providers::completions::Gemini;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let model = Gemini::new(&GeminiConfig::from_env()?)?;
/// let reply = model
///     .generate("Explain embeddings in one sentence", &GenerationConfig::default())
///     .await?;
/// println!("{}", reply.text);
/// # Ok(())
/// # }
/// ```
pub struct GeminiCompletionModel {
    api_key: String,
    generate_url: String,
    stream_url: String,
    client: reqwest::Client,
    model: String,
}

impl GeminiCompletionModel {
    /// Fails when the HTTP client for `config` can't be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: config.api_key.clone(),
            generate_url: config.method_url(&config.model, "generateContent"),
            stream_url: format!(
                "{}?alt=sse",
                config.method_url(&config.model, "streamGenerateContent")
            ),
            client: config.http_client()?,
            model: config.model.clone(),
        })
    }

    async fn post(
        &self,
        url: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<reqwest::Response, CompletionError> {
        debug!(model = %self.model, url, "Sending request to Gemini");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Request failed");
                CompletionError::RequestError(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "Received API response");
        if status.is_success() {
            return Ok(response);
        }
        let error_msg = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error (failed to read response body)".to_string());
        error!(
            status = %status,
            error = %error_msg,
            "API returned error response"
        );
        Err(CompletionError::ProviderError(status.into(), error_msg))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Content {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(ToString::to_string),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    /// Preambles are merged into the system instruction, the rest keeps its order.
    fn new(message: Message, history: &[Message], config: &'a GenerationConfig) -> Self {
        let mut system = vec![];
        let mut contents = vec![];
        for m in history.iter().cloned().chain(std::iter::once(message)) {
            match m {
                Message::Preamble(s) => system.push(s),
                Message::User(s) => contents.push(Content::text(Some("user"), s)),
                Message::Assistant(s) => contents.push(Content::text(Some("model"), s)),
            }
        }
        let system_instruction = if system.is_empty() {
            None
        } else {
            Some(Content::text(None, system.join("\n")))
        };
        let generation_config = if *config == GenerationConfig::default() {
            None
        } else {
            Some(config)
        };
        Self {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

/// Finish reasons that mean the reply was cut off by the provider's filters
/// rather than completed.
const BLOCKING_FINISH_REASONS: [&str; 6] = [
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

impl GenerateContentResponse {
    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    /// The first candidate's finish reason, when it's one of the filter stops
    fn blocked_finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|reason| BLOCKING_FINISH_REASONS.contains(reason))
    }

    /// Text of the first candidate, all of its parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn token_usage(&self) -> TokenUsage {
        self.usage_metadata
            .as_ref()
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default()
    }

    fn into_result(self) -> Result<GenerationResult, CompletionError> {
        if self.candidates.is_empty() {
            return Err(match self.block_reason() {
                Some(reason) => CompletionError::Blocked(reason.to_string()),
                None => CompletionError::ParseError("Response has no candidates".to_string()),
            });
        }
        let text = self.text();
        if text.is_empty() {
            if let Some(reason) = self.blocked_finish_reason() {
                return Err(CompletionError::Blocked(reason.to_string()));
            }
        }
        Ok(GenerationResult {
            text,
            token_usage: self.token_usage(),
            finish_reason: self.candidates[0].finish_reason.clone(),
        })
    }
}

/// Incremental decoder for the `alt=sse` stream of `streamGenerateContent`.
///
/// Bytes are buffered until a full line is available, so events and
/// multi-byte characters may be split across network chunks.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<Result<String, CompletionError>> {
        self.buffer.extend_from_slice(chunk);
        let mut fragments = vec![];
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            fragments.extend(Self::parse_line(&line));
        }
        fragments
    }

    /// Flush whatever is left once the body has ended.
    fn finish(&mut self) -> Vec<Result<String, CompletionError>> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line)
    }

    /// An event yields its text, then a `Blocked` error when the provider
    /// stopped the reply with a filter.
    fn parse_line(line: &[u8]) -> Vec<Result<String, CompletionError>> {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line,
            Err(e) => return vec![Err(CompletionError::ParseError(e.to_string()))],
        };
        let Some(data) = line
            .trim_end_matches(['\r', '\n'])
            .strip_prefix("data:")
            .map(str::trim_start)
        else {
            return vec![];
        };
        if data.is_empty() || data == "[DONE]" {
            return vec![];
        }
        let response: GenerateContentResponse = match serde_json::from_str(data) {
            Ok(r) => r,
            Err(e) => {
                error!(error = ?e, "Failed to parse stream event");
                return vec![Err(CompletionError::ParseError(e.to_string()))];
            }
        };
        if response.candidates.is_empty() {
            return response
                .block_reason()
                .map(|reason| Err(CompletionError::Blocked(reason.to_string())))
                .into_iter()
                .collect();
        }
        let mut fragments = vec![];
        let text = response.text();
        if !text.is_empty() {
            fragments.push(Ok(text));
        }
        if let Some(reason) = response.blocked_finish_reason() {
            warn!(reason, "Stream stopped by the provider's filters");
            fragments.push(Err(CompletionError::Blocked(reason.to_string())));
        }
        fragments
    }
}

#[async_trait]
impl CompletionModel for GeminiCompletionModel {
    #[instrument(
        skip(self, message, history, config),
        fields(history_len = history.len())
    )]
    async fn send(
        &self,
        message: Message,
        history: &[Message],
        config: &GenerationConfig,
    ) -> Result<GenerationResult, CompletionError> {
        config.validate()?;
        let request_body = GenerateContentRequest::new(message, history, config);
        let response = self.post(&self.generate_url, &request_body).await?;

        let response: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse response JSON");
            CompletionError::ParseError(e.to_string())
        })?;
        let result = response.into_result()?;

        info!(
            prompt_tokens = result.token_usage.prompt_tokens,
            completion_tokens = result.token_usage.completion_tokens,
            total_tokens = result.token_usage.total_tokens,
            "Token usage recorded"
        );
        Ok(result)
    }

    #[instrument(
        skip(self, message, history, config),
        fields(history_len = history.len())
    )]
    async fn stream(
        &self,
        message: Message,
        history: &[Message],
        config: &GenerationConfig,
    ) -> Result<TextStream, CompletionError> {
        config.validate()?;
        let request_body = GenerateContentRequest::new(message, history, config);
        let response = self.post(&self.stream_url, &request_body).await?;

        let state = StreamState {
            body: Box::pin(response.bytes_stream()),
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        };
        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(fragment) = state.pending.pop_front() {
                    return Some((fragment, state));
                }
                if state.done {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(bytes)) => {
                        let fragments = state.decoder.push(&bytes);
                        state.pending.extend(fragments);
                    }
                    Some(Err(e)) => {
                        error!(error = ?e, "Stream interrupted");
                        state.done = true;
                        state
                            .pending
                            .push_back(Err(CompletionError::RequestError(e.to_string())));
                    }
                    None => {
                        state.done = true;
                        let fragments = state.decoder.finish();
                        state.pending.extend(fragments);
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

struct StreamState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, CompletionError>>,
    done: bool,
}
