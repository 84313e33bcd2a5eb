//! OpenAI-compatible embedding provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::embeddings::EmbeddingConfig;
use crate::errors::EmbeddingError;
use crate::interfaces::EmbeddingProvider;

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

/// Provider speaking the OpenAI `/embeddings` wire format.
///
/// Works against api.openai.com as well as self-hosted inference servers
/// exposing the same endpoint.
pub struct OpenAiEmbeddings {
    http: Client,
    config: EmbeddingConfig,
}

impl OpenAiEmbeddings {
    /// Create a new provider from the given configuration.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Url::parse(&config.base_url)
            .map_err(|e| EmbeddingError::configuration(format!("invalid base url: {}", e)))?;

        let http = Client::builder()
            .build()
            .map_err(|e| EmbeddingError::configuration(e.to_string()))?;

        info!(base_url = %config.base_url, model = %config.model, "Created embedding provider");

        Ok(Self { http, config })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/embeddings",
            self.config.base_url.trim_end_matches('/')
        );

        let mut request = self.http.post(&url).json(&serde_json::json!({
            "model": self.config.model,
            "input": texts
        }));
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::provider(format!(
                "embeddings request failed with status {}: {}",
                status, body
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::invalid_response(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(EmbeddingError::invalid_response(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        debug!(count = texts.len(), model = %self.config.model, "Embedded texts");
        Ok(body.data.into_iter().map(|e| e.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
