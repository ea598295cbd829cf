pub mod embedding;
pub mod model;

use std::time::Duration;
use thiserror::Error;

pub use embedding::Embedding;
pub use model::{EmbeddingModel, TaskType};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedderError {
    #[error("Provider error -> HTTP Status {0}: {1}")]
    ProviderError(u16, String),
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("Embedding request timed out after {0:?}")]
    Timeout(Duration),
}
