use std::sync::Arc;

use ragwire_core::{Document, RagwireError};
use ragwire_models::ProviderBackend;
use serde_json::{json, Value};

use crate::api;

/// Metadata key the reranker writes each document's relevance score under.
pub const RELEVANCE_SCORE_KEY: &str = "relevance_score";

/// Configuration for the Cohere reranker.
#[derive(Debug, Clone)]
pub struct CohereRerankerConfig {
    pub api_key: String,
    /// Model name (default: `"rerank-v3.5"`).
    pub model: String,
    /// Maximum number of documents to return. `None` returns all of them.
    pub top_n: Option<usize>,
    /// Base URL (default: `"https://api.cohere.com/v2"`).
    pub base_url: String,
}

impl CohereRerankerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "rerank-v3.5".to_string(),
            top_n: None,
            base_url: api::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build a config from `COHERE_API_KEY`.
    pub fn from_env() -> Result<Self, RagwireError> {
        Ok(Self::new(api::api_key_from_env()?))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Reranks documents with the Cohere `/rerank` endpoint.
pub struct CohereReranker {
    config: CohereRerankerConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl CohereReranker {
    pub fn new(config: CohereRerankerConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &CohereRerankerConfig {
        &self.config
    }

    /// Rerank `documents` against `query`, most relevant first.
    ///
    /// `top_n` overrides the configured limit. Every returned document carries
    /// its score under [`RELEVANCE_SCORE_KEY`] in its metadata.
    pub async fn rerank(
        &self,
        query: &str,
        documents: Vec<Document>,
        top_n: Option<usize>,
    ) -> Result<Vec<Document>, RagwireError> {
        let scored = self.rerank_with_scores(query, documents, top_n).await?;
        Ok(scored.into_iter().map(|(doc, _)| doc).collect())
    }

    /// Like [`rerank`](Self::rerank) but also returns the scores alongside.
    pub async fn rerank_with_scores(
        &self,
        query: &str,
        documents: Vec<Document>,
        top_n: Option<usize>,
    ) -> Result<Vec<(Document, f32)>, RagwireError> {
        let top_n = top_n.or(self.config.top_n);
        if documents.is_empty() || top_n == Some(0) {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let mut body = json!({
            "model": self.config.model,
            "query": query,
            "documents": texts,
        });
        if let Some(n) = top_n {
            body["top_n"] = json!(n);
        }

        let request = api::request(&self.config.base_url, "rerank", &self.config.api_key, body);
        let resp = self.backend.send(request).await?;
        api::check_status(&resp, "rerank", RagwireError::Reranker)?;

        let results = resp.body["results"]
            .as_array()
            .ok_or_else(|| RagwireError::Parsing("Cohere rerank: missing results".to_string()))?;

        let mut reranked = Vec::with_capacity(results.len());
        for item in results {
            let index = item["index"].as_u64().ok_or_else(|| {
                RagwireError::Parsing("Cohere rerank: result without index".to_string())
            })? as usize;
            let score = item["relevance_score"].as_f64().unwrap_or(0.0);
            let mut doc = documents.get(index).cloned().ok_or_else(|| {
                RagwireError::Parsing(format!(
                    "Cohere rerank: index {index} out of range for {} documents",
                    documents.len()
                ))
            })?;
            doc.metadata
                .insert(RELEVANCE_SCORE_KEY.to_string(), Value::from(score));
            reranked.push((doc, score as f32));
        }

        tracing::debug!(
            model = %self.config.model,
            candidates = documents.len(),
            returned = reranked.len(),
            "reranked documents"
        );
        Ok(reranked)
    }
}

#[cfg(feature = "retrieval")]
#[async_trait::async_trait]
impl ragwire_retrieval::DocumentCompressor for CohereReranker {
    async fn compress_documents(
        &self,
        documents: Vec<Document>,
        query: &str,
    ) -> Result<Vec<Document>, RagwireError> {
        self.rerank(query, documents, None).await
    }
}
