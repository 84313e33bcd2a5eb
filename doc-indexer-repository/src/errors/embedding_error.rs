//! Embedding provider error types.

use thiserror::Error;

/// Errors that can occur while generating embeddings.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Provider configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request to the provider failed.
    #[error("Request error: {0}")]
    RequestError(String),

    /// The provider rejected the request or returned an error body.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The provider returned a body we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EmbeddingError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderError(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
