/// Builtin completion models
pub mod completions;

/// Builtin embedding models
pub mod embeddings;
