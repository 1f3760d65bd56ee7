use std::sync::Arc;

use async_trait::async_trait;
use ragwire_core::{Embeddings, RagwireError};
use ragwire_models::{ProviderBackend, ProviderRequest};
use serde_json::{json, Value};

use crate::{token_from_env, DEFAULT_BASE_URL};

#[derive(Debug, Clone)]
pub struct HuggingFaceEmbeddingsConfig {
    pub model: String,
    pub api_key: Option<String>,
    /// Models prefix; requests go to `{base_url}/{model}/pipeline/feature-extraction`.
    pub base_url: String,
    /// Ask the API to wait for a cold model instead of returning 503.
    pub wait_for_model: bool,
}

impl HuggingFaceEmbeddingsConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: token_from_env(),
            base_url: DEFAULT_BASE_URL.to_string(),
            wait_for_model: true,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_wait_for_model(mut self, wait: bool) -> Self {
        self.wait_for_model = wait;
        self
    }
}

/// Embeddings from the Hugging Face feature-extraction pipeline.
///
/// The pipeline is addressed explicitly, so sentence-transformers models return
/// vectors instead of running their default sentence-similarity task.
pub struct HuggingFaceEmbeddings {
    config: HuggingFaceEmbeddingsConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl HuggingFaceEmbeddings {
    pub fn new(config: HuggingFaceEmbeddingsConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagwireError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(key) = &self.config.api_key {
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        }
        if self.config.wait_for_model {
            headers.push(("x-wait-for-model".to_string(), "true".to_string()));
        }
        let url = format!(
            "{}/{}/pipeline/feature-extraction",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        tracing::debug!(model = %self.config.model, count = texts.len(), "Hugging Face embed request");
        let request = ProviderRequest {
            url,
            headers,
            body: json!({ "inputs": texts }),
        };

        let resp = self.backend.send(request).await?;
        if resp.status == 429 {
            return Err(RagwireError::RateLimit(resp.body.to_string()));
        }
        if resp.status >= 400 {
            return Err(RagwireError::Embedding(format!(
                "HuggingFace API error ({}): {}",
                resp.status, resp.body
            )));
        }
        parse_hf_response(&resp.body)
    }
}

/// Accepts a bare array of vectors or `{"embeddings": [...]}`.
fn parse_hf_response(resp: &Value) -> Result<Vec<Vec<f32>>, RagwireError> {
    let array = if let Some(arr) = resp.as_array() {
        arr
    } else if let Some(arr) = resp.get("embeddings").and_then(Value::as_array) {
        arr
    } else {
        return Err(RagwireError::Embedding(
            "unexpected HuggingFace response format".to_string(),
        ));
    };
    array
        .iter()
        .map(|item| {
            item.as_array()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                })
                .ok_or_else(|| RagwireError::Embedding("embedding item is not an array".to_string()))
        })
        .collect()
}

#[async_trait]
impl Embeddings for HuggingFaceEmbeddings {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagwireError> {
        self.embed_batch(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagwireError> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| RagwireError::Embedding("empty HuggingFace response".to_string()))
    }
}
