pub use crate::{
    chunking::ChunkStrategy,
    completion::{
        ChatSession, CompletionModel, GenerationConfig, GenerationResult, Message, TokenUsage,
    },
    config::GeminiConfig,
    document::Document,
    embeddings::{EmbeddingModel, TaskType},
    index::{QueryMatch, SemanticIndex},
    loader::FileLoader,
    rag::{RagAnswer, RagPipeline, RagStream},
    vector_store::{InMemoryVectorStore, VectorStore},
};
