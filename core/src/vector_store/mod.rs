mod in_memory_vec_store;

use async_trait::async_trait;
use thiserror::Error;

use crate::embeddings::embedding::Embedding;

pub use in_memory_vec_store::InMemoryVectorStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorStoreError {
    #[error("Embedding `{0}` not found")]
    EmbeddingNotFound(String),
    #[error("An embedding with id `{0}` is already stored")]
    DuplicateId(String),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A stored embedding paired with its similarity to a query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEmbedding {
    pub embedding: Embedding,
    pub score: f64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Embedding, VectorStoreError>;

    /// Insert a new embedding. Rejects ids that are already stored and vectors
    /// whose length differs from the store's dimension; on rejection the store
    /// is left as it was.
    async fn store(&self, embedding: Embedding) -> Result<(), VectorStoreError>;

    async fn remove(&self, id: &str) -> Result<Embedding, VectorStoreError>;

    /// The `n` stored embeddings most similar to `query`, best first.
    async fn top_n(&self, query: &[f64], n: usize) -> Result<Vec<ScoredEmbedding>, VectorStoreError>;

    async fn contains(&self, id: &str) -> bool {
        self.get_by_id(id).await.is_ok()
    }

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Dimensionality shared by every stored vector, `None` until it's known.
    async fn dimension(&self) -> Option<usize>;
}

/// Cosine of the angle between `a` and `b`.
///
/// Returns `0.0` when either vector has zero norm or the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot_product: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}
