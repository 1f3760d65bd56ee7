use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{Document, Embeddings, RagwireError, Retriever, VectorStore};

/// A retriever that wraps a [`VectorStore`], bridging it to the [`Retriever`] trait.
pub struct VectorStoreRetriever<S: VectorStore> {
    store: Arc<S>,
    embeddings: Arc<dyn Embeddings>,
    k: usize,
    score_threshold: Option<f32>,
}

impl<S: VectorStore + 'static> VectorStoreRetriever<S> {
    pub fn new(store: Arc<S>, embeddings: Arc<dyn Embeddings>, k: usize) -> Self {
        Self {
            store,
            embeddings,
            k,
            score_threshold: None,
        }
    }

    /// Only return documents whose store-reported score is at least `threshold`,
    /// or at most `threshold` for stores that score by distance.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: VectorStore + 'static> Retriever for VectorStoreRetriever<S> {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Document>, RagwireError> {
        let k = if top_k > 0 { top_k } else { self.k };

        if let Some(threshold) = self.score_threshold {
            let scored = self
                .store
                .similarity_search_with_score(query, k, self.embeddings.as_ref())
                .await?;
            let total = scored.len();
            let higher_is_closer = self.store.higher_score_is_closer();
            let kept: Vec<Document> = scored
                .into_iter()
                .filter(|(_, score)| {
                    if higher_is_closer {
                        *score >= threshold
                    } else {
                        *score <= threshold
                    }
                })
                .map(|(doc, _)| doc)
                .collect();
            tracing::debug!(total, kept = kept.len(), threshold, higher_is_closer, "applied score threshold");
            Ok(kept)
        } else {
            self.store
                .similarity_search(query, k, self.embeddings.as_ref())
                .await
        }
    }
}
