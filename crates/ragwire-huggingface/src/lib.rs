//! Hugging Face integration for Ragwire.
//!
//! - [`HuggingFaceEndpoint`] calls a text-generation endpoint: a dedicated
//!   Inference Endpoint, a self-hosted text-generation-inference server, or a
//!   Hub model served through the inference router. It also implements
//!   [`ChatModel`](ragwire_core::ChatModel) by rendering the conversation as a
//!   plain-text prompt.
//! - [`HuggingFaceEmbeddings`] calls the feature-extraction pipeline.
//!
//! ```rust,no_run
//! use ragwire_huggingface::{HuggingFaceEndpoint, HuggingFaceEndpointConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = HuggingFaceEndpoint::connect(
//!     HuggingFaceEndpointConfig::new()
//!         .with_repo_id("mistralai/Mistral-7B-Instruct-v0.3")
//!         .with_max_new_tokens(128),
//! )?;
//! let text = llm.generate("What is deep learning?", &[]).await?;
//! # Ok(())
//! # }
//! ```

mod embeddings;
mod endpoint;

pub use embeddings::{HuggingFaceEmbeddings, HuggingFaceEmbeddingsConfig};
pub use endpoint::{HuggingFaceEndpoint, HuggingFaceEndpointConfig, TextStream};

pub(crate) const ROUTER_URL: &str = "https://router.huggingface.co";
pub(crate) const DEFAULT_PROVIDER: &str = "hf-inference";
pub(crate) const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// `HUGGINGFACEHUB_API_TOKEN`, falling back to `HF_TOKEN`.
pub(crate) fn token_from_env() -> Option<String> {
    std::env::var("HUGGINGFACEHUB_API_TOKEN")
        .or_else(|_| std::env::var("HF_TOKEN"))
        .ok()
        .filter(|t| !t.is_empty())
}
