//! # ragkit - Core API Documentation
//!
//! ragkit is a small Rust library for semantic retrieval and retrieval
//! augmented generation on top of Google's Gemini API.
//!
//! ## Features
//!
//! - **Semantic index** that embeds documents, keeps them in a vector store
//!   and ranks them against a query by cosine similarity
//! - **Modular architecture** with clearly defined components:
//!   - **Loaders**: reading documents from files matched by glob patterns
//!   - **Chunking**: splitting long documents by size, sentence or paragraph
//!   - **Vector Stores**: embedding storage and retrieval (In-memory)
//!   - **Embedders**: text embedding providers
//!   - **LLM Clients**: completion models with blocking and streamed replies
//! - **Chat sessions** keeping a bounded conversation history
//!
//! ## Examples
//!
//! The `core/examples` directory has runnable programs showing how the
//! pieces fit together.
//!
//! ### Building a simple RAG
//!
//! ```rust,no_run
//! use ragkit::prelude::*;
//! use ragkit::providers::{completions::Gemini, embeddings::GeminiEmbedding};
//!
//! #[tokio::main]
//! async fn main() -> ragkit::error::Result<()> {
//!     let config = GeminiConfig::from_env()?;
//!
//!     let index = SemanticIndex::new(GeminiEmbedding::new(&config)?);
//!     index.ingest("doc1", "Python is a programming language").await?;
//!     index.ingest("doc2", "Cats are popular pets").await?;
//!
//!     let rag = RagPipeline::new(index, Gemini::new(&config)?);
//!     let answer = rag.answer("What is Python?", 1).await?;
//!     println!("{} (from {})", answer.text, answer.sources[0].id);
//!     Ok(())
//! }
//! ```
//!
//! ### Chatting with history
//!
//! ```rust,no_run
//! use ragkit::prelude::*;
//! use ragkit::providers::completions::Gemini;
//!
//! #[tokio::main]
//! async fn main() -> ragkit::error::Result<()> {
//!     let config = GeminiConfig::from_env()?;
//!     let mut chat = ChatSession::new(Gemini::new(&config)?)
//!         .with_preamble("You are a helpful assistant")
//!         .with_config(GenerationConfig::default().temperature(0.2))
//!         .with_max_turns(10);
//!
//!     chat.send("My name is Ada").await?;
//!     let reply = chat.send("What's my name?").await?;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```

/// Splitting long texts into passages before indexing
pub mod chunking;

/// Language model completion and conversation management
///
/// Contains:
/// - The `CompletionModel` trait providers implement
/// - Message history tracking through `ChatSession`
/// - Generation parameters and token accounting
pub mod completion;

/// Provider connection settings
pub mod config;

/// Document processing and representation utilities
///
/// Provides core types for handling text documents in embedding and retrieval workflows.
pub mod document;

/// Text embeddings support
pub mod embeddings;

/// Error types for all library operations
pub mod error;

/// Semantic search over embedded documents
pub mod index;

/// Resource loading utilities
pub mod loader;

/// Convenience prelude exports
pub mod prelude;

/// Builtin completion and embedding model providers
pub mod providers;

/// Retrieval augmented generation
pub mod rag;

/// Vector storage and retrieval
pub mod vector_store;
