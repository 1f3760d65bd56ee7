use std::sync::Arc;

use ragwire::cohere::{
    CohereChatConfig, CohereChatModel, CohereEmbeddings, CohereEmbeddingsConfig, CohereReranker,
    CohereRerankerConfig, RELEVANCE_SCORE_KEY,
};
use ragwire::core::{
    ChatModel, ChatRequest, ChatResponse, Document, Embeddings, Message, RagwireError,
    RunnableConfig, VectorStore,
};
use ragwire::embeddings::FakeEmbeddings;
use ragwire::models::{
    FakeBackend, HttpBackend, ProviderBackend, ProviderResponse, RetryBackend, RetryPolicy,
    ScriptedChatModel,
};
use ragwire::retrieval::{ContextualCompressionRetriever, VectorStoreRetriever};
use ragwire::runnables::{
    format_documents, ChatModelRunnable, RetrieverRunnable, Runnable, RunnableLambda,
};
use ragwire::surrealdb::{SurrealConfig, SurrealVectorStore};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const QUESTION: &str = "How does SurrealDB store vectors?";

fn corpus() -> Vec<Document> {
    vec![
        Document::new("surreal-1", "SurrealDB is a multi-model database that stores documents, graphs and vectors in one engine."),
        Document::new("surreal-2", "SurrealDB defines vector indexes with DEFINE INDEX ... MTREE DIMENSION n DIST COSINE."),
        Document::new("cats-1", "Cats sleep between twelve and sixteen hours a day."),
    ]
}

struct Services {
    db: Arc<dyn ProviderBackend>,
    cohere: Arc<dyn ProviderBackend>,
    embeddings: Arc<dyn Embeddings>,
    chat: Arc<dyn ChatModel>,
    config: SurrealConfig,
}

/// Real services, configured from `SURREALDB_*` and `COHERE_API_KEY`. Rate-limited
/// calls are retried.
fn live_services() -> Result<Services, RagwireError> {
    let http: Arc<dyn ProviderBackend> = Arc::new(RetryBackend::new(
        Arc::new(HttpBackend::new()),
        RetryPolicy::default(),
    ));
    Ok(Services {
        db: http.clone(),
        cohere: http.clone(),
        embeddings: Arc::new(CohereEmbeddings::new(CohereEmbeddingsConfig::from_env()?, http.clone())),
        chat: Arc::new(CohereChatModel::new(CohereChatConfig::from_env()?, http)),
        config: SurrealConfig::from_env().with_dimension(1024),
    })
}

/// Canned replies so the pipeline runs without network access.
fn offline_services() -> Services {
    let db = FakeBackend::new();
    db.push_response(ProviderResponse::ok(json!({"id": 1, "result": [{"status": "OK", "result": null}]})));
    db.push_response(ProviderResponse::ok(json!({"id": 2, "result": [
        {"status": "OK", "result": [{"id": "documents:surreal-1"}]},
        {"status": "OK", "result": [{"id": "documents:surreal-2"}]},
        {"status": "OK", "result": [{"id": "documents:cats-1"}]}
    ]})));
    let texts: Vec<String> = corpus().into_iter().map(|d| d.content).collect();
    let hits = json!({"status": "OK", "result": [
        {"id": "documents:surreal-1", "text": texts[0], "metadata": {}, "score": 0.83},
        {"id": "documents:cats-1", "text": texts[2], "metadata": {}, "score": 0.61},
        {"id": "documents:surreal-2", "text": texts[1], "metadata": {}, "score": 0.58}
    ]});
    db.push_response(ProviderResponse::ok(json!({"id": 3, "result": [hits.clone()]})));
    db.push_response(ProviderResponse::ok(json!({"id": 4, "result": [hits]})));

    let cohere = FakeBackend::new();
    cohere.push_response(ProviderResponse::ok(json!({"results": [
        {"index": 2, "relevance_score": 0.91},
        {"index": 0, "relevance_score": 0.47}
    ]})));

    let chat = ScriptedChatModel::new(vec![ChatResponse {
        message: Message::ai("It stores them as array fields and indexes them with an MTREE vector index."),
        usage: None,
    }]);

    Services {
        db: Arc::new(db),
        cohere: Arc::new(cohere),
        embeddings: Arc::new(FakeEmbeddings::new(4)),
        chat: Arc::new(chat),
        config: SurrealConfig::new("http://localhost:8000", "demo", "demo", "documents")
            .with_dimension(4),
    }
}

#[tokio::main]
async fn main() -> Result<(), RagwireError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let live = std::env::var("RAGWIRE_LIVE").is_ok();
    let services = if live { live_services()? } else { offline_services() };
    tracing::info!(live, "starting rerank pipeline");

    // --- Vector store ---
    println!("=== Indexing ===");
    let store = Arc::new(SurrealVectorStore::new(services.config, services.db)?);
    store.ensure_index().await?;
    let ids = store
        .add_documents(corpus(), services.embeddings.as_ref())
        .await?;
    println!("Stored ids: {ids:?}");

    println!("\n=== Similarity search ===");
    let hits = store
        .similarity_search_with_score(QUESTION, 3, services.embeddings.as_ref())
        .await?;
    for (doc, score) in &hits {
        println!("  {score:.2}  {}", doc.content);
    }

    // --- Rerank ---
    println!("\n=== Reranked retrieval ===");
    let rerank_config = if live {
        CohereRerankerConfig::from_env()?
    } else {
        CohereRerankerConfig::new("offline")
    };
    let reranker = CohereReranker::new(rerank_config.with_top_n(2), services.cohere);
    let retriever = Arc::new(ContextualCompressionRetriever::new(
        Arc::new(VectorStoreRetriever::new(store.clone(), services.embeddings.clone(), 3)),
        Arc::new(reranker),
    ));

    // --- Chain: retrieve | prompt | chat ---
    let prompt = RunnableLambda::new(|docs: Vec<Document>| async move {
        for doc in &docs {
            println!(
                "  {:.2}  {}",
                doc.metadata
                    .get(RELEVANCE_SCORE_KEY)
                    .and_then(|v| v.as_f64())
                    .unwrap_or_default(),
                doc.content
            );
        }
        Ok(ChatRequest::new(vec![
            Message::system(format!(
                "Answer using only this context:\n\n{}",
                format_documents(&docs)
            )),
            Message::human(QUESTION),
        ]))
    });
    let chain = RetrieverRunnable::new(retriever, 3).boxed()
        | prompt.boxed()
        | ChatModelRunnable::new(services.chat).boxed();

    let config = RunnableConfig::default().with_run_name("rerank_pipeline");
    let answer = chain.invoke(QUESTION.to_string(), &config).await?;

    println!("\n=== Answer ===\n{}", answer.content());
    Ok(())
}
