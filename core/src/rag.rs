use tracing::{info, instrument};

use crate::{
    completion::{CompletionModel, GenerationConfig, TextStream, TokenUsage},
    embeddings::EmbeddingModel,
    index::{QueryMatch, SemanticIndex},
    vector_store::{InMemoryVectorStore, VectorStore},
};

/// Separator between retrieved passages in the context block
pub const CONTEXT_DELIMITER: &str = "\n";

/// The prompt sent to the completion model for `question`, grounded on `context`.
#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}

/// Joins the retrieved texts in rank order.
#[must_use]
pub fn join_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    pub text: String,
    /// Passages the answer was grounded on, best match first
    pub sources: Vec<QueryMatch>,
    pub token_usage: TokenUsage,
}

pub struct RagStream {
    pub sources: Vec<QueryMatch>,
    pub stream: TextStream,
}

/// Retrieval-augmented generation over a [`SemanticIndex`].
///
/// Retrieval failures are returned to the caller, the pipeline never falls
/// back to an ungrounded answer. An empty retrieval is not a failure: the
/// prompt is still sent, with an empty context.
pub struct RagPipeline<E: EmbeddingModel, C: CompletionModel, V: VectorStore = InMemoryVectorStore> {
    index: SemanticIndex<E, V>,
    completion_model: C,
    config: GenerationConfig,
}

impl<E: EmbeddingModel, C: CompletionModel, V: VectorStore> RagPipeline<E, C, V> {
    pub fn new(index: SemanticIndex<E, V>, completion_model: C) -> Self {
        Self {
            index,
            completion_model,
            config: GenerationConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// The index, for ingesting documents
    pub fn index(&self) -> &SemanticIndex<E, V> {
        &self.index
    }

    #[instrument(skip(self, question))]
    pub async fn answer(&self, question: &str, top_k: usize) -> Result<RagAnswer, crate::error::Error> {
        let (prompt, sources) = self.augment(question, top_k).await?;
        let result = self.completion_model.generate(&prompt, &self.config).await?;
        Ok(RagAnswer {
            text: result.text,
            sources,
            token_usage: result.token_usage,
        })
    }

    /// Like [`RagPipeline::answer`] but the answer is streamed.
    #[instrument(skip(self, question))]
    pub async fn answer_stream(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<RagStream, crate::error::Error> {
        let (prompt, sources) = self.augment(question, top_k).await?;
        let stream = self
            .completion_model
            .stream(
                crate::completion::Message::User(prompt),
                &[],
                &self.config,
            )
            .await?;
        Ok(RagStream { sources, stream })
    }

    async fn augment(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<(String, Vec<QueryMatch>), crate::error::Error> {
        let sources = self.index.query(question, top_k).await?;
        info!(retrieved = sources.len(), "Retrieved context");
        let context = join_context(&sources);
        Ok((build_prompt(&context, question), sources))
    }
}
