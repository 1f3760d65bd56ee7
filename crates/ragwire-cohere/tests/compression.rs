#![cfg(feature = "retrieval")]

use std::sync::Arc;

use async_trait::async_trait;
use ragwire_cohere::{CohereReranker, CohereRerankerConfig};
use ragwire_core::{Document, RagwireError, Retriever};
use ragwire_models::{FakeBackend, ProviderResponse};
use ragwire_retrieval::ContextualCompressionRetriever;
use serde_json::json;

struct FixedRetriever;

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<Document>, RagwireError> {
        Ok(vec![
            Document::new("a", "cats sleep a lot"),
            Document::new("b", "SurrealDB supports vector search"),
        ])
    }
}

#[tokio::test]
async fn reranker_compresses_base_results() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({
        "results": [{"index": 1, "relevance_score": 0.93}]
    })));
    let reranker = CohereReranker::new(CohereRerankerConfig::new("k").with_top_n(1), backend);
    let retriever =
        ContextualCompressionRetriever::new(Arc::new(FixedRetriever), Arc::new(reranker));

    let docs = retriever.retrieve("vector search", 5).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "b");
}
