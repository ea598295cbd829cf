use crate::embeddings::EmbedderError;
use async_trait::async_trait;

/// What the embedded text will be used for.
///
/// Retrieval models embed stored passages and search queries differently, so
/// the same text may yield different vectors per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Text that gets stored and searched over
    Document,
    /// Text that's used to search the stored documents
    Query,
}

impl TaskType {
    /// Name of the task type on the Gemini wire format
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Document => "RETRIEVAL_DOCUMENT",
            TaskType::Query => "RETRIEVAL_QUERY",
        }
    }
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed `data` for the given task.
    ///
    /// Implementations must fail rather than return an empty or zeroed
    /// vector when the service can't produce one.
    async fn embed(&self, data: &str, task: TaskType) -> Result<Vec<f64>, EmbedderError>;
}
