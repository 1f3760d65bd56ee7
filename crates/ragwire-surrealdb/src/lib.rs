//! SurrealDB vector store integration for Ragwire.
//!
//! This crate provides [`SurrealVectorStore`], an implementation of the
//! [`VectorStore`](ragwire_core::VectorStore) trait backed by
//! [SurrealDB](https://surrealdb.com/). Every operation is a single call to
//! the database's JSON-RPC endpoint (`POST /rpc`, method `query`); similarity
//! is computed server-side with SurrealDB's `vector::*` functions.
//!
//! # Example
//!
//! ```rust,no_run
//! use ragwire_core::{Document, VectorStore};
//! use ragwire_embeddings::FakeEmbeddings;
//! use ragwire_surrealdb::{SurrealConfig, SurrealVectorStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SurrealConfig::new("http://localhost:8000", "ns", "db", "documents")
//!     .with_credentials("root", "root");
//! let store = SurrealVectorStore::connect(config)?;
//! let embeddings = FakeEmbeddings::new(4);
//!
//! store
//!     .add_documents(vec![Document::new("1", "SurrealDB is multi-model")], &embeddings)
//!     .await?;
//! let hits = store.similarity_search_with_score("multi-model", 3, &embeddings).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod filter;
mod rpc;
mod vector_store;

pub use config::{Distance, SurrealAuth, SurrealConfig};
pub use filter::MetadataFilter;
pub use vector_store::SurrealVectorStore;

// Re-export core traits for convenience.
pub use ragwire_core::{Document, Embeddings, VectorStore};
