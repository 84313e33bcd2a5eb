//! Embedding provider implementations and factory.
//!
//! Providers are selected through a factory keyed on a provider tag. Adding
//! a backend means implementing [`EmbeddingProvider`](crate::interfaces::EmbeddingProvider)
//! and extending the factory match.

mod openai;

use std::sync::Arc;

pub use openai::OpenAiEmbeddings;

use crate::errors::EmbeddingError;
use crate::interfaces::EmbeddingProvider;

/// Connection settings for an embedding provider.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Provider base URL (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    /// API key, if the provider requires one.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
}

/// Build an embedding provider from a provider tag.
///
/// Known tags: `openai` and `openai-compatible` (any endpoint speaking the
/// OpenAI embeddings wire format, e.g. a local inference server).
pub fn embedding_provider_from_tag(
    tag: &str,
    config: EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match tag {
        "openai" | "openai-compatible" => Ok(Arc::new(OpenAiEmbeddings::new(config)?)),
        other => Err(EmbeddingError::configuration(format!(
            "unknown embedding provider tag: {}",
            other
        ))),
    }
}
