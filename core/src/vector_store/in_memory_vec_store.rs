use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{cosine_similarity, ScoredEmbedding, VectorStore, VectorStoreError};
use crate::embeddings::embedding::Embedding;

#[derive(Debug, Default)]
struct Entries {
    // insertion order, ties in `top_n` resolve to the earlier entry
    embeddings: Vec<Embedding>,
    dimension: Option<usize>,
}

/// Vector store that keeps every embedding in process memory and answers
/// queries with a linear scan.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Entries>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that only accepts vectors of length `dimension`.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(Entries {
                embeddings: vec![],
                dimension: Some(dimension),
            }),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_by_id(&self, id: &str) -> Result<Embedding, VectorStoreError> {
        let entries = self.entries.read().await;
        entries
            .embeddings
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| VectorStoreError::EmbeddingNotFound(id.to_string()))
    }

    async fn store(&self, embedding: Embedding) -> Result<(), VectorStoreError> {
        let mut entries = self.entries.write().await;
        if let Some(expected) = entries.dimension {
            if embedding.dimension() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: embedding.dimension(),
                });
            }
        }
        if entries.embeddings.iter().any(|e| e.id == embedding.id) {
            return Err(VectorStoreError::DuplicateId(embedding.id));
        }
        entries.dimension = Some(embedding.dimension());
        debug!(id = %embedding.id, "Stored embedding");
        entries.embeddings.push(embedding);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<Embedding, VectorStoreError> {
        let mut entries = self.entries.write().await;
        let position = entries
            .embeddings
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| VectorStoreError::EmbeddingNotFound(id.to_string()))?;
        Ok(entries.embeddings.remove(position))
    }

    async fn top_n(&self, query: &[f64], n: usize) -> Result<Vec<ScoredEmbedding>, VectorStoreError> {
        let entries = self.entries.read().await;
        if let Some(expected) = entries.dimension {
            if query.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }
        let mut scores = entries
            .embeddings
            .iter()
            .enumerate()
            .map(|(position, embedding)| (position, cosine_similarity(query, &embedding.embedded_data)))
            .collect::<Vec<_>>();
        // stable, so equal scores keep insertion order
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores.truncate(n);
        Ok(scores
            .into_iter()
            .map(|(position, score)| ScoredEmbedding {
                embedding: entries.embeddings[position].clone(),
                score,
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.embeddings.len()
    }

    async fn dimension(&self) -> Option<usize> {
        self.entries.read().await.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(id: &str, raw: &str, data: Vec<f64>) -> Embedding {
        Embedding::new(id, raw, data)
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = InMemoryVectorStore::new();
        let e = embedding("id", "hello world", vec![1.0, 2.0, 3.0]);
        store.store(e.clone()).await.unwrap();

        // test getting existing embedding
        let result = store.get_by_id("id").await;
        assert_eq!(result.unwrap(), e);

        // test getting non-existing embedding
        let result = store.get_by_id("non_existant_id").await;
        assert_eq!(
            result.unwrap_err(),
            VectorStoreError::EmbeddingNotFound("non_existant_id".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_rejects_duplicate_id() {
        let store = InMemoryVectorStore::new();
        let original = embedding("id", "hello world", vec![1.0, 2.0, 3.0]);
        store.store(original.clone()).await.unwrap();

        let result = store
            .store(embedding("id", "shalom world", vec![4.0, 5.0, 6.0]))
            .await;
        assert_eq!(result, Err(VectorStoreError::DuplicateId("id".to_string())));

        // the original is untouched
        assert_eq!(store.get_by_id("id").await.unwrap(), original);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_rejects_wrong_dimension() {
        let store = InMemoryVectorStore::new();
        store
            .store(embedding("a", "a", vec![1.0, 2.0, 3.0]))
            .await
            .unwrap();
        let result = store.store(embedding("b", "b", vec![1.0, 2.0])).await;
        assert_eq!(
            result,
            Err(VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(store.len().await, 1);
        assert_eq!(store.dimension().await, Some(3));
    }

    #[tokio::test]
    async fn test_pinned_dimension() {
        let store = InMemoryVectorStore::with_dimension(4);
        assert!(store.is_empty().await);
        let result = store.store(embedding("a", "a", vec![1.0])).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { expected: 4, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryVectorStore::new();
        store
            .store(embedding("id", "hello", vec![1.0, 0.0]))
            .await
            .unwrap();
        let removed = store.remove("id").await.unwrap();
        assert_eq!(removed.raw_data, "hello");
        assert!(store.is_empty().await);
        assert_eq!(
            store.remove("id").await.unwrap_err(),
            VectorStoreError::EmbeddingNotFound("id".to_string())
        );
    }

    #[tokio::test]
    async fn test_top_n() {
        let store = InMemoryVectorStore::new();
        let embedding1 = embedding("id1", "hello world", vec![1.0, 2.0, 3.0]);
        let embedding2 = embedding("id2", "shalom world", vec![4.0, 5.0, 6.0]);
        let embedding3 = embedding("id3", "selam world", vec![7.0, 8.0, 9.0]);
        for e in [&embedding1, &embedding2, &embedding3] {
            store.store(e.clone()).await.unwrap();
        }

        let top_n = store.top_n(&[1.0, 2.0, 3.0], 2).await.unwrap();
        assert_eq!(top_n.len(), 2);
        assert_eq!(top_n[0].embedding, embedding1);
        assert_eq!(top_n[1].embedding, embedding2);
        assert!(top_n[0].score > top_n[1].score);
    }

    #[tokio::test]
    async fn test_top_n_ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store
            .store(embedding("first", "a", vec![2.0, 0.0]))
            .await
            .unwrap();
        store
            .store(embedding("second", "b", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .store(embedding("third", "c", vec![5.0, 0.0]))
            .await
            .unwrap();

        let ids: Vec<_> = store
            .top_n(&[1.0, 0.0], 3)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.embedding.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_top_n_keeps_only_the_best_scored_entries() {
        let store = InMemoryVectorStore::new();
        let vectors = [
            ("far", vec![0.0, 1.0]),
            ("closest", vec![1.0, 0.0]),
            ("opposite", vec![-1.0, 0.0]),
            ("close", vec![1.0, 0.5]),
        ];
        for (id, data) in vectors {
            store.store(embedding(id, id, data)).await.unwrap();
        }

        let top = store.top_n(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].embedding, embedding("closest", "closest", vec![1.0, 0.0]));
        assert!((top[0].score - 1.0).abs() < 1e-9);
        assert_eq!(top[1].embedding.id, "close");
        assert_eq!(top[1].embedding.embedded_data, vec![1.0, 0.5]);
        assert!((top[1].score - 1.0 / 1.25_f64.sqrt()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_top_n_rejects_wrong_query_dimension() {
        let store = InMemoryVectorStore::new();
        store
            .store(embedding("a", "a", vec![1.0, 2.0, 3.0]))
            .await
            .unwrap();
        let result = store.top_n(&[1.0], 1).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { expected: 3, actual: 1 })
        ));
    }
}
