use std::sync::Arc;

use ragwire_cohere::{CohereEmbeddings, CohereEmbeddingsConfig};
use ragwire_core::{Embeddings, RagwireError};
use ragwire_models::{FakeBackend, ProviderResponse};
use serde_json::json;

#[tokio::test]
async fn documents_and_queries_use_different_input_types() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({
        "embeddings": {"float": [[0.1, 0.2], [0.3, 0.4]]}
    })));
    backend.push_response(ProviderResponse::ok(json!({
        "embeddings": {"float": [[0.5, 0.6]]}
    })));
    let embeddings = CohereEmbeddings::new(CohereEmbeddingsConfig::new("k"), backend.clone());

    let docs = embeddings.embed_documents(&["a", "b"]).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1], vec![0.3, 0.4]);

    let query = embeddings.embed_query("q").await.unwrap();
    assert_eq!(query, vec![0.5, 0.6]);

    let requests = backend.requests().await;
    assert!(requests[0].url.ends_with("/embed"));
    assert_eq!(requests[0].body["input_type"], "search_document");
    assert_eq!(requests[0].body["embedding_types"], json!(["float"]));
    assert_eq!(requests[1].body["input_type"], "search_query");
    assert_eq!(requests[1].body["texts"], json!(["q"]));
}

#[tokio::test]
async fn empty_input_makes_no_request() {
    let backend = Arc::new(FakeBackend::new());
    let embeddings = CohereEmbeddings::new(CohereEmbeddingsConfig::new("k"), backend.clone());

    assert!(embeddings.embed_documents(&[]).await.unwrap().is_empty());
    assert_eq!(backend.request_count().await, 0);
}

#[tokio::test]
async fn missing_float_embeddings_is_an_error() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({"embeddings": {}})));
    let embeddings = CohereEmbeddings::new(CohereEmbeddingsConfig::new("k"), backend);

    let err = embeddings.embed_query("q").await.unwrap_err();
    assert!(matches!(err, RagwireError::Embedding(_)));
}
