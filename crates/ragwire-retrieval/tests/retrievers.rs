use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{Document, Embeddings, RagwireError, Retriever, VectorStore};
use ragwire_embeddings::FakeEmbeddings;
use ragwire_retrieval::{ContextualCompressionRetriever, DocumentCompressor, VectorStoreRetriever};
use tokio::sync::Mutex;

/// Store that returns canned scored results and records the requested `k`.
struct CannedStore {
    results: Vec<(Document, f32)>,
    last_k: Mutex<Option<usize>>,
    higher_is_closer: bool,
}

impl CannedStore {
    fn new(results: Vec<(Document, f32)>) -> Self {
        Self {
            results,
            last_k: Mutex::new(None),
            higher_is_closer: true,
        }
    }

    /// Results scored by distance, nearest first.
    fn by_distance(results: Vec<(Document, f32)>) -> Self {
        Self {
            higher_is_closer: false,
            ..Self::new(results)
        }
    }
}

#[async_trait]
impl VectorStore for CannedStore {
    async fn add_documents(
        &self,
        docs: Vec<Document>,
        _embeddings: &dyn Embeddings,
    ) -> Result<Vec<String>, RagwireError> {
        Ok(docs.into_iter().map(|d| d.id).collect())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        embeddings: &dyn Embeddings,
    ) -> Result<Vec<Document>, RagwireError> {
        Ok(self
            .similarity_search_with_score(query, k, embeddings)
            .await?
            .into_iter()
            .map(|(d, _)| d)
            .collect())
    }

    async fn similarity_search_with_score(
        &self,
        _query: &str,
        k: usize,
        _embeddings: &dyn Embeddings,
    ) -> Result<Vec<(Document, f32)>, RagwireError> {
        *self.last_k.lock().await = Some(k);
        Ok(self.results.iter().take(k).cloned().collect())
    }

    async fn similarity_search_by_vector(
        &self,
        _embedding: &[f32],
        _k: usize,
    ) -> Result<Vec<Document>, RagwireError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _ids: &[&str]) -> Result<(), RagwireError> {
        Ok(())
    }

    fn higher_score_is_closer(&self) -> bool {
        self.higher_is_closer
    }
}

fn scored() -> Vec<(Document, f32)> {
    vec![
        (Document::new("a", "alpha"), 0.9),
        (Document::new("b", "beta"), 0.6),
        (Document::new("c", "gamma"), 0.2),
    ]
}

#[tokio::test]
async fn uses_default_k_when_top_k_is_zero() {
    let store = Arc::new(CannedStore::new(scored()));
    let retriever = VectorStoreRetriever::new(store.clone(), Arc::new(FakeEmbeddings::default()), 2);

    let docs = retriever.retrieve("q", 0).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(*store.last_k.lock().await, Some(2));

    retriever.retrieve("q", 3).await.unwrap();
    assert_eq!(*store.last_k.lock().await, Some(3));
}

#[tokio::test]
async fn score_threshold_filters_low_scores() {
    let store = Arc::new(CannedStore::new(scored()));
    let retriever = VectorStoreRetriever::new(store, Arc::new(FakeEmbeddings::default()), 3)
        .with_score_threshold(0.5);

    let ids: Vec<String> = retriever
        .retrieve("q", 0)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn score_threshold_keeps_near_rows_for_distance_stores() {
    let store = Arc::new(CannedStore::by_distance(vec![
        (Document::new("near", "alpha"), 0.1),
        (Document::new("mid", "beta"), 0.4),
        (Document::new("far", "gamma"), 1.7),
    ]));
    let retriever = VectorStoreRetriever::new(store, Arc::new(FakeEmbeddings::default()), 3)
        .with_score_threshold(0.5);

    let ids: Vec<String> = retriever
        .retrieve("q", 0)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["near", "mid"]);
}

struct ReverseCompressor {
    calls: Mutex<usize>,
}

#[async_trait]
impl DocumentCompressor for ReverseCompressor {
    async fn compress_documents(
        &self,
        mut documents: Vec<Document>,
        _query: &str,
    ) -> Result<Vec<Document>, RagwireError> {
        *self.calls.lock().await += 1;
        documents.reverse();
        documents.truncate(1);
        Ok(documents)
    }
}

#[tokio::test]
async fn compression_retriever_applies_compressor() {
    let store = Arc::new(CannedStore::new(scored()));
    let base = Arc::new(VectorStoreRetriever::new(
        store,
        Arc::new(FakeEmbeddings::default()),
        3,
    ));
    let compressor = Arc::new(ReverseCompressor {
        calls: Mutex::new(0),
    });
    let retriever = ContextualCompressionRetriever::new(base, compressor.clone());

    let docs = retriever.retrieve("q", 3).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "c");
    assert_eq!(*compressor.calls.lock().await, 1);
}

#[tokio::test]
async fn compression_skipped_for_empty_candidates() {
    let store = Arc::new(CannedStore::new(Vec::new()));
    let base = Arc::new(VectorStoreRetriever::new(
        store,
        Arc::new(FakeEmbeddings::default()),
        3,
    ));
    let compressor = Arc::new(ReverseCompressor {
        calls: Mutex::new(0),
    });
    let retriever = ContextualCompressionRetriever::new(base, compressor.clone());

    assert!(retriever.retrieve("q", 3).await.unwrap().is_empty());
    assert_eq!(*compressor.calls.lock().await, 0);
}
