//! Cohere integration for Ragwire.
//!
//! This crate provides:
//! - [`CohereReranker`], a client for the
//!   [Cohere Rerank API](https://docs.cohere.com/reference/rerank) that reorders
//!   documents by relevance to a query.
//! - [`CohereEmbeddings`], which passes the retrieval `input_type` Cohere needs
//!   (`search_document` for documents, `search_query` for queries).
//! - [`CohereChatModel`], a [`ChatModel`](ragwire_core::ChatModel) over the v2
//!   chat endpoint with server-sent-event streaming.
//!
//! All three talk to Cohere through a [`ProviderBackend`](ragwire_models::ProviderBackend),
//! so tests can swap in a [`FakeBackend`](ragwire_models::FakeBackend).
//!
//! When the `retrieval` feature is enabled, `CohereReranker` also implements
//! [`DocumentCompressor`](ragwire_retrieval::DocumentCompressor), making it usable
//! with [`ContextualCompressionRetriever`](ragwire_retrieval::ContextualCompressionRetriever).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragwire_cohere::{CohereReranker, CohereRerankerConfig};
//! use ragwire_core::Document;
//! use ragwire_models::HttpBackend;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CohereRerankerConfig::from_env()?.with_top_n(3);
//! let reranker = CohereReranker::new(config, Arc::new(HttpBackend::new()));
//!
//! let docs = vec![
//!     Document::new("1", "Rust is a systems programming language"),
//!     Document::new("2", "Python is great for data science"),
//! ];
//!
//! let reranked = reranker.rerank("systems programming", docs, None).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod chat;
mod embeddings;
mod reranker;

pub use chat::{CohereChatConfig, CohereChatModel};
pub use embeddings::{CohereEmbeddings, CohereEmbeddingsConfig, CohereInputType};
pub use reranker::{CohereReranker, CohereRerankerConfig, RELEVANCE_SCORE_KEY};

// Re-export core types for convenience.
pub use ragwire_core::Document;
