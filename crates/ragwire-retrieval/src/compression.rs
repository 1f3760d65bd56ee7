use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::RagwireError;

use crate::{Document, Retriever};

/// Reorders, trims or filters a set of documents based on a query.
///
/// Rerankers implement this so they can post-process any retriever.
#[async_trait]
pub trait DocumentCompressor: Send + Sync {
    async fn compress_documents(
        &self,
        documents: Vec<Document>,
        query: &str,
    ) -> Result<Vec<Document>, RagwireError>;
}

/// Retrieves candidates from a base retriever, then passes them through a compressor.
pub struct ContextualCompressionRetriever {
    base: Arc<dyn Retriever>,
    compressor: Arc<dyn DocumentCompressor>,
}

impl ContextualCompressionRetriever {
    pub fn new(base: Arc<dyn Retriever>, compressor: Arc<dyn DocumentCompressor>) -> Self {
        Self { base, compressor }
    }
}

#[async_trait]
impl Retriever for ContextualCompressionRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Document>, RagwireError> {
        let docs = self.base.retrieve(query, top_k).await?;
        if docs.is_empty() {
            return Ok(docs);
        }
        self.compressor.compress_documents(docs, query).await
    }
}
