pub(crate) mod gemini;

pub use gemini::GeminiEmbeddingModel as GeminiEmbedding;
