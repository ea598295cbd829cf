use crate::{
    completion::CompletionError,
    config::ConfigError,
    embeddings::EmbedderError,
    index::{BatchIngestError, IndexError},
    loader::FileLoaderError,
    vector_store::VectorStoreError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("Ingestion error: {0}")]
    Ingest(#[from] BatchIngestError),
    #[error("VectorStore error: {0}")]
    VectorStore(#[from] VectorStoreError),
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("Loader error: {0}")]
    Loader(#[from] FileLoaderError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
