use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    chunking::{chunk, ChunkStrategy},
    document::Document,
    embeddings::{embedding::Embedding, EmbedderError, EmbeddingModel, TaskType},
    vector_store::{InMemoryVectorStore, VectorStore, VectorStoreError},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Embedding service error: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("A document with id `{0}` is already indexed")]
    DuplicateId(String),
    #[error("Document `{0}` not found")]
    NotFound(String),
}

impl From<VectorStoreError> for IndexError {
    fn from(value: VectorStoreError) -> Self {
        match value {
            VectorStoreError::DimensionMismatch { expected, actual } => {
                IndexError::DimensionMismatch { expected, actual }
            }
            VectorStoreError::DuplicateId(id) => IndexError::DuplicateId(id),
            VectorStoreError::EmbeddingNotFound(id) => IndexError::NotFound(id),
        }
    }
}

/// Error from a batch ingestion, carrying how many documents got stored
/// before the failing one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Ingestion stopped after {stored} documents at `{failed_id}`: {source}")]
pub struct BatchIngestError {
    pub stored: usize,
    pub failed_id: String,
    #[source]
    pub source: IndexError,
}

/// A single ranked hit of a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub score: f64,
}

/// In-memory semantic search over embedded documents.
///
/// Documents are embedded through `M` on ingestion and held in `V`; queries
/// are embedded the same way and ranked by cosine similarity against every
/// stored document.
pub struct SemanticIndex<M: EmbeddingModel, V: VectorStore = InMemoryVectorStore> {
    embedding_model: M,
    vector_store: V,
    timeout: Option<Duration>,
}

impl<M: EmbeddingModel> SemanticIndex<M, InMemoryVectorStore> {
    /// Creates an empty index backed by an [`InMemoryVectorStore`]
    pub fn new(embedding_model: M) -> Self {
        Self::with_store(embedding_model, InMemoryVectorStore::new())
    }
}

impl<M: EmbeddingModel, V: VectorStore> SemanticIndex<M, V> {
    pub fn with_store(embedding_model: M, vector_store: V) -> Self {
        Self {
            embedding_model,
            vector_store,
            timeout: None,
        }
    }

    /// Bound every embedding call made by this index to `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Embed `text` and store it under `id`.
    ///
    /// Either the document ends up fully stored or the index is unchanged.
    /// Empty text is accepted as-is, the quality of its embedding is up to the
    /// embedding service.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn ingest(&self, id: &str, text: &str) -> Result<(), IndexError> {
        if id.is_empty() {
            return Err(IndexError::InvalidArgument(
                "document id must not be empty".to_string(),
            ));
        }
        if text.is_empty() {
            warn!(id, "Ingesting a document with empty text");
        }
        if self.vector_store.contains(id).await {
            return Err(IndexError::DuplicateId(id.to_string()));
        }

        let embedded_data = self.embed(text, TaskType::Document).await?;
        self.vector_store
            .store(Embedding::new(id, text, embedded_data))
            .await?;
        info!(id, "Document indexed");
        Ok(())
    }

    /// Ingest documents in order, stopping at the first failure.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<usize, BatchIngestError> {
        for (stored, doc) in documents.iter().enumerate() {
            self.ingest(&doc.id, &doc.text)
                .await
                .map_err(|source| BatchIngestError {
                    stored,
                    failed_id: doc.id.clone(),
                    source,
                })?;
        }
        Ok(documents.len())
    }

    /// Split `text` with `strategy` and ingest every piece as `"{id}#{n}"`,
    /// counting from zero. Returns the ids of the stored chunks.
    pub async fn ingest_chunked(
        &self,
        id: &str,
        text: &str,
        strategy: ChunkStrategy,
    ) -> Result<Vec<String>, BatchIngestError> {
        let documents: Vec<Document> = chunk(text, strategy)
            .into_iter()
            .enumerate()
            .map(|(n, piece)| Document::new_with_id(format!("{id}#{n}"), piece))
            .collect();
        self.ingest_documents(&documents).await?;
        Ok(documents.into_iter().map(|d| d.id).collect())
    }

    /// The `top_k` stored documents most similar to `text`, best first.
    ///
    /// `top_k` is clamped to the number of stored documents. A `top_k` of
    /// zero or an empty index yields no results without calling the
    /// embedding service.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryMatch>, IndexError> {
        if top_k == 0 || self.vector_store.is_empty().await {
            return Ok(vec![]);
        }
        let query = self.embed(text, TaskType::Query).await?;
        let matches: Vec<QueryMatch> = self
            .vector_store
            .top_n(&query, top_k)
            .await?
            .into_iter()
            .map(|scored| QueryMatch {
                id: scored.embedding.id,
                text: scored.embedding.raw_data,
                score: scored.score,
            })
            .collect();
        info!(results = matches.len(), "Query answered");
        Ok(matches)
    }

    pub async fn get(&self, id: &str) -> Result<Document, IndexError> {
        self.vector_store
            .get_by_id(id)
            .await
            .map(|e| Document::new_with_id(e.id, e.raw_data))
            .map_err(IndexError::from)
    }

    pub async fn remove(&self, id: &str) -> Result<(), IndexError> {
        self.vector_store
            .remove(id)
            .await
            .map(|_| ())
            .map_err(IndexError::from)
    }

    pub async fn len(&self) -> usize {
        self.vector_store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.vector_store.is_empty().await
    }

    /// Dimensionality of the stored embeddings, once known
    pub async fn dimension(&self) -> Option<usize> {
        self.vector_store.dimension().await
    }

    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f64>, IndexError> {
        let call = self.embedding_model.embed(text, task);
        let embedded = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| EmbedderError::Timeout(limit))??,
            None => call.await?,
        };
        if embedded.is_empty() {
            return Err(EmbedderError::ParseError("service returned an empty embedding".to_string()).into());
        }
        Ok(embedded)
    }
}
