//! Embedding provider trait definition.

use async_trait::async_trait;

use crate::errors::EmbeddingError;

/// Capability interface for turning text into fixed-length vectors.
///
/// Providers are selected through a factory keyed on a provider tag rather
/// than an inheritance hierarchy; see [`crate::embeddings`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Name of the underlying model, for logging and diagnostics.
    fn model_name(&self) -> &str;
}

/// Discover the dimensionality of a provider by embedding a sample text.
///
/// The collection provisioner uses this to detect dimension drift between
/// the configured model and an existing collection.
pub async fn probe_dimension(provider: &dyn EmbeddingProvider) -> Result<usize, EmbeddingError> {
    let sample = provider.embed(&["test".to_string()]).await?;
    sample
        .first()
        .map(|v| v.len())
        .filter(|len| *len > 0)
        .ok_or_else(|| EmbeddingError::invalid_response("provider returned no sample embedding"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        dim: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.0; self.dim]).collect())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_probe_dimension() {
        let provider = FixedProvider { dim: 384 };
        assert_eq!(probe_dimension(&provider).await.unwrap(), 384);
    }

    #[tokio::test]
    async fn test_probe_dimension_empty_vector() {
        let provider = FixedProvider { dim: 0 };
        assert!(probe_dimension(&provider).await.is_err());
    }
}
