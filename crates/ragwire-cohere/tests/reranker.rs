use std::sync::Arc;

use ragwire_cohere::{CohereReranker, CohereRerankerConfig, RELEVANCE_SCORE_KEY};
use ragwire_core::{Document, RagwireError};
use ragwire_models::{FakeBackend, HttpBackend, ProviderResponse};
use serde_json::json;

fn docs() -> Vec<Document> {
    vec![
        Document::new("1", "Python is great for data science"),
        Document::new("2", "Rust is a systems programming language"),
        Document::new("3", "JavaScript runs in the browser"),
    ]
}

fn reranker(backend: &Arc<FakeBackend>, config: CohereRerankerConfig) -> CohereReranker {
    CohereReranker::new(config, backend.clone())
}

#[tokio::test]
async fn rerank_empty_documents_makes_no_request() {
    let backend = Arc::new(FakeBackend::new());
    let reranker = reranker(&backend, CohereRerankerConfig::new("test-key"));

    let result = reranker.rerank("query", Vec::new(), None).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(backend.request_count().await, 0);
}

#[tokio::test]
async fn rerank_orders_by_returned_results_and_sets_scores() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({
        "id": "r-1",
        "results": [
            {"index": 1, "relevance_score": 0.98},
            {"index": 0, "relevance_score": 0.12}
        ],
        "meta": {"billed_units": {"search_units": 1}}
    })));
    let reranker = reranker(&backend, CohereRerankerConfig::new("test-key").with_top_n(2));

    let result = reranker
        .rerank("systems programming", docs(), None)
        .await
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, "2");
    assert_eq!(result[1].id, "1");
    assert_eq!(result[0].metadata[RELEVANCE_SCORE_KEY], json!(0.98));

    let requests = backend.requests().await;
    let request = &requests[0];
    assert_eq!(request.url, "https://api.cohere.com/v2/rerank");
    assert_eq!(request.header("Authorization"), Some("Bearer test-key"));
    assert_eq!(request.body["model"], "rerank-v3.5");
    assert_eq!(request.body["query"], "systems programming");
    assert_eq!(request.body["top_n"], 2);
    assert_eq!(request.body["documents"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn call_site_top_n_overrides_config() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({
        "results": [{"index": 2, "relevance_score": 0.5}]
    })));
    let reranker = reranker(&backend, CohereRerankerConfig::new("k").with_top_n(3));

    let scored = reranker
        .rerank_with_scores("browser", docs(), Some(1))
        .await
        .unwrap();
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].0.id, "3");
    assert!((scored[0].1 - 0.5).abs() < 1e-6);

    let requests = backend.requests().await;
    assert_eq!(requests[0].body["top_n"], 1);
}

#[tokio::test]
async fn top_n_omitted_when_unset() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({"results": []})));
    let reranker = reranker(&backend, CohereRerankerConfig::new("k"));

    reranker.rerank("q", docs(), None).await.unwrap();
    let requests = backend.requests().await;
    assert!(requests[0].body.get("top_n").is_none());
}

#[tokio::test]
async fn out_of_range_index_is_a_parsing_error() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse::ok(json!({
        "results": [{"index": 7, "relevance_score": 0.9}]
    })));
    let reranker = reranker(&backend, CohereRerankerConfig::new("k"));

    let err = reranker.rerank("q", docs(), None).await.unwrap_err();
    assert!(matches!(err, RagwireError::Parsing(_)));
}

#[tokio::test]
async fn api_errors_map_to_reranker_and_rate_limit() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 400,
        body: json!({"message": "invalid request: query must not be empty"}),
    });
    backend.push_response(ProviderResponse {
        status: 429,
        body: json!({"message": "too many requests"}),
    });
    let reranker = reranker(&backend, CohereRerankerConfig::new("k"));

    let err = reranker.rerank("", docs(), None).await.unwrap_err();
    assert!(matches!(err, RagwireError::Reranker(_)));
    assert!(err.to_string().contains("query must not be empty"));

    let err = reranker.rerank("q", docs(), None).await.unwrap_err();
    assert!(matches!(err, RagwireError::RateLimit(_)));
}

#[tokio::test]
#[ignore] // Requires Cohere API key
async fn integration_rerank() {
    let config = CohereRerankerConfig::from_env()
        .expect("COHERE_API_KEY must be set")
        .with_top_n(2);
    let reranker = CohereReranker::new(config, Arc::new(HttpBackend::new()));

    let result = reranker
        .rerank("systems programming", docs(), None)
        .await
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, "2");
    for doc in &result {
        assert!(doc.metadata.contains_key(RELEVANCE_SCORE_KEY));
    }
}
