mod compression;
mod vector_store;

pub use compression::{ContextualCompressionRetriever, DocumentCompressor};
pub use vector_store::VectorStoreRetriever;

// Re-export Document and Retriever from core.
pub use ragwire_core::{Document, Retriever};
