//! Cohere embeddings over the native v2 API.
//!
//! Cohere expects an `input_type`: `search_document` when embedding documents
//! and `search_query` when embedding queries.

use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{Embeddings, RagwireError};
use ragwire_models::ProviderBackend;
use serde_json::json;

use crate::api;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohereInputType {
    /// For embedding documents to be stored in a vector database.
    SearchDocument,
    /// For embedding queries used to search the vector database.
    SearchQuery,
    Classification,
    Clustering,
}

impl CohereInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CohereInputType::SearchDocument => "search_document",
            CohereInputType::SearchQuery => "search_query",
            CohereInputType::Classification => "classification",
            CohereInputType::Clustering => "clustering",
        }
    }
}

/// Configuration for [`CohereEmbeddings`].
#[derive(Debug, Clone)]
pub struct CohereEmbeddingsConfig {
    pub api_key: String,
    /// Model name (default: `"embed-english-v3.0"`).
    pub model: String,
    /// Input type for document embedding (default: `SearchDocument`).
    pub input_type: CohereInputType,
    /// Input type for query embedding (default: `SearchQuery`).
    pub query_input_type: CohereInputType,
    pub base_url: String,
}

impl CohereEmbeddingsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "embed-english-v3.0".to_string(),
            input_type: CohereInputType::SearchDocument,
            query_input_type: CohereInputType::SearchQuery,
            base_url: api::DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, RagwireError> {
        Ok(Self::new(api::api_key_from_env()?))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_input_type(mut self, input_type: CohereInputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Embeddings backed by the Cohere Embed API.
pub struct CohereEmbeddings {
    config: CohereEmbeddingsConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl CohereEmbeddings {
    pub fn new(config: CohereEmbeddingsConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }

    async fn embed_with_type(
        &self,
        texts: &[&str],
        input_type: CohereInputType,
    ) -> Result<Vec<Vec<f32>>, RagwireError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.config.model,
            "texts": texts,
            "input_type": input_type.as_str(),
            "embedding_types": ["float"],
        });
        tracing::debug!(
            model = %self.config.model,
            count = texts.len(),
            input_type = input_type.as_str(),
            "Cohere embed request"
        );
        let request = api::request(&self.config.base_url, "embed", &self.config.api_key, body);
        let resp = self.backend.send(request).await?;
        api::check_status(&resp, "embed", RagwireError::Embedding)?;

        let float_embeddings = resp.body["embeddings"]["float"]
            .as_array()
            .ok_or_else(|| RagwireError::Embedding("missing embeddings.float".to_string()))?;

        let mut result = Vec::with_capacity(float_embeddings.len());
        for embedding in float_embeddings {
            let vec = embedding
                .as_array()
                .ok_or_else(|| RagwireError::Embedding("embedding is not an array".to_string()))?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            result.push(vec);
        }
        Ok(result)
    }
}

#[async_trait]
impl Embeddings for CohereEmbeddings {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagwireError> {
        self.embed_with_type(texts, self.config.input_type).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagwireError> {
        self.embed_with_type(&[text], self.config.query_input_type)
            .await?
            .pop()
            .ok_or_else(|| RagwireError::Embedding("empty response".to_string()))
    }
}
