use tracing::{info, instrument};

use super::{
    CompletionError, CompletionModel, GenerationConfig, GenerationResult, Message, MessageHistory,
    TokenUsage,
};

/// A multi-turn conversation with a completion model.
///
/// The session owns the history that gets sent with every prompt. An
/// optional preamble (system instruction) always stays first. With
/// `with_max_turns` set, the oldest user/assistant pairs are dropped once the
/// limit is exceeded.
pub struct ChatSession<M: CompletionModel> {
    completion_model: M,
    history: MessageHistory,
    config: GenerationConfig,
    max_turns: Option<usize>,
    token_usage: TokenUsage,
}

impl<M: CompletionModel> ChatSession<M> {
    pub fn new(completion_model: M) -> Self {
        Self {
            completion_model,
            history: vec![],
            config: GenerationConfig::default(),
            max_turns: None,
            token_usage: TokenUsage::default(),
        }
    }

    #[must_use]
    pub fn with_preamble(mut self, preamble: impl AsRef<str>) -> Self {
        self.history.retain(|m| !matches!(m, Message::Preamble(_)));
        self.history
            .insert(0, Message::Preamble(preamble.as_ref().to_string()));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Remember at most `max_turns` exchanges besides the preamble.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self.evict();
        self
    }

    /// Sends `prompt` with the conversation so far.
    ///
    /// The prompt and the reply are added to the history only when the
    /// request succeeds.
    #[instrument(skip(self, prompt), fields(history_len = self.history.len()))]
    pub async fn send(&mut self, prompt: impl Into<String>) -> Result<GenerationResult, CompletionError> {
        self.config.validate()?;
        let prompt = prompt.into();
        let result = self
            .completion_model
            .send(Message::User(prompt.clone()), &self.history, &self.config)
            .await?;

        self.history.push(Message::User(prompt));
        self.history.push(Message::Assistant(result.text.clone()));
        self.evict();

        self.token_usage.accumulate(&result.token_usage);
        if result.token_usage.total_tokens.is_some() {
            info!(
                "Prompt used up: {:?} tokens, Total tokens used: {:?}",
                result.token_usage.total_tokens, self.token_usage.total_tokens
            );
        }
        Ok(result)
    }

    /// Clear conversation history while maintaining premble
    pub fn clear_history(&mut self) {
        self.history.retain(|m| matches!(m, Message::Preamble(_)));
    }

    pub fn load_history(&mut self, history: MessageHistory) {
        self.history = history;
        self.evict();
    }

    #[must_use]
    pub fn export_history(&self) -> &MessageHistory {
        &self.history
    }

    /// Tokens used by every successful prompt of this session
    #[must_use]
    pub fn token_usage(&self) -> TokenUsage {
        self.token_usage
    }

    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn evict(&mut self) {
        let Some(max_turns) = self.max_turns else {
            return;
        };
        let start = usize::from(matches!(self.history.first(), Some(Message::Preamble(_))));
        let max_messages = max_turns * 2;
        let excess = (self.history.len() - start).saturating_sub(max_messages);
        if excess > 0 {
            self.history.drain(start..start + excess);
        }
    }
}
