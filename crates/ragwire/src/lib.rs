//! Ragwire: typed clients for hosted vector stores, rerankers and
//! text-generation endpoints, plus the glue to compose them into
//! retrieval-augmented pipelines.
//!
//! This crate re-exports the Ragwire sub-crates behind feature flags.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `runnables`, `retrieval` |
//! | `model-utils` | `ProviderBackend`, `FakeBackend`, `RetryBackend`, `ScriptedChatModel` |
//! | `embeddings` | `FakeEmbeddings` |
//! | `surrealdb` | SurrealDB vector store |
//! | `cohere` | Cohere reranker (as a `DocumentCompressor`), embeddings and chat |
//! | `huggingface` | Hugging Face text-generation endpoint and embeddings |
//! | `rag` | `default` + embeddings + surrealdb + cohere |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ragwire::core::{Document, VectorStore};
//! use ragwire::surrealdb::{SurrealConfig, SurrealVectorStore};
//! use ragwire::cohere::{CohereReranker, CohereRerankerConfig};
//! use ragwire::retrieval::{ContextualCompressionRetriever, VectorStoreRetriever};
//! ```

/// Core traits and types: Document, Message, ChatModel, Embeddings, VectorStore,
/// Retriever, RagwireError. Always available.
pub use ragwire_core as core;

/// Provider transport (`HttpBackend`, `FakeBackend`, `RetryBackend`) and `ScriptedChatModel`.
#[cfg(feature = "model-utils")]
pub use ragwire_models as models;

/// Deterministic embeddings for tests and demos.
#[cfg(feature = "embeddings")]
pub use ragwire_embeddings as embeddings;

/// Composition: Runnable, BoxRunnable with `|`, lambdas and adapters.
#[cfg(feature = "runnables")]
pub use ragwire_runnables as runnables;

/// VectorStoreRetriever, DocumentCompressor, ContextualCompressionRetriever.
#[cfg(feature = "retrieval")]
pub use ragwire_retrieval as retrieval;

/// SurrealDB vector store over the JSON-RPC HTTP endpoint.
#[cfg(feature = "surrealdb")]
pub use ragwire_surrealdb as surrealdb;

/// Cohere rerank, embed and chat.
#[cfg(feature = "cohere")]
pub use ragwire_cohere as cohere;

/// Hugging Face text generation and embeddings.
#[cfg(feature = "huggingface")]
pub use ragwire_huggingface as huggingface;
