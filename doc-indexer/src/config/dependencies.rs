//! Dependency initialization and wiring for the document indexer.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::IndexerError;
use doc_indexer_pipeline::{IndexingPipeline, IndexingPipelineConfig};
use doc_indexer_repository::{
    embedding_provider_from_tag, ArangoConfig, ArangoRecordStore, EmbeddingConfig, QdrantRestStore,
    VectorStore,
};

/// Default Qdrant URL.
const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

/// Default ArangoDB URL.
const DEFAULT_ARANGO_URL: &str = "http://localhost:8529";

/// Default ArangoDB database name.
const DEFAULT_ARANGO_DATABASE: &str = "documents";

/// Default record collection.
const DEFAULT_RECORDS_COLLECTION: &str = "records";

/// Default vector store collection for chunks.
const DEFAULT_CHUNKS_COLLECTION: &str = "chunks";

/// Default embedding provider tag.
const DEFAULT_EMBEDDING_PROVIDER: &str = "openai";

/// Default embedding provider base URL.
const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured pipeline ready to index documents.
    pub pipeline: IndexingPipeline,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QDRANT_URL`: Qdrant server URL (default: http://localhost:6333)
    /// - `QDRANT_API_KEY`: Qdrant API key (optional)
    /// - `ARANGO_URL`: ArangoDB server URL (default: http://localhost:8529)
    /// - `ARANGO_DATABASE`: ArangoDB database name (default: documents)
    /// - `ARANGO_USERNAME`: ArangoDB user (default: root)
    /// - `ARANGO_PASSWORD`: ArangoDB password (default: empty)
    /// - `RECORDS_COLLECTION`: record collection name (default: records)
    /// - `CHUNKS_COLLECTION`: vector collection name (default: chunks)
    /// - `EMBEDDING_PROVIDER`: provider tag (default: openai)
    /// - `EMBEDDING_BASE_URL`: provider base URL (default: OpenAI)
    /// - `EMBEDDING_API_KEY`: provider API key (optional)
    /// - `EMBEDDING_MODEL`: model identifier (default: text-embedding-3-small)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexerError)` - If initialization fails
    pub async fn new() -> Result<Self, IndexerError> {
        dotenv::dotenv().ok();

        let qdrant_url = env::var("QDRANT_URL").unwrap_or_else(|_| DEFAULT_QDRANT_URL.to_string());
        let qdrant_api_key = env::var("QDRANT_API_KEY").ok();
        let chunks_collection =
            env::var("CHUNKS_COLLECTION").unwrap_or_else(|_| DEFAULT_CHUNKS_COLLECTION.to_string());
        let records_collection = env::var("RECORDS_COLLECTION")
            .unwrap_or_else(|_| DEFAULT_RECORDS_COLLECTION.to_string());

        info!(
            qdrant_url = %qdrant_url,
            chunks_collection = %chunks_collection,
            records_collection = %records_collection,
            "Initializing dependencies"
        );

        let vector_store = QdrantRestStore::new(&qdrant_url, qdrant_api_key)
            .map_err(|e| IndexerError::config(format!("Failed to create Qdrant client: {}", e)))?;

        // Verify Qdrant is reachable before wiring anything else.
        vector_store
            .get_collection(&chunks_collection)
            .await
            .map_err(|e| IndexerError::config(format!("Qdrant is unreachable: {}", e)))?;

        info!("Qdrant connection verified");

        let arango_config = ArangoConfig {
            url: env::var("ARANGO_URL").unwrap_or_else(|_| DEFAULT_ARANGO_URL.to_string()),
            database: env::var("ARANGO_DATABASE")
                .unwrap_or_else(|_| DEFAULT_ARANGO_DATABASE.to_string()),
            username: env::var("ARANGO_USERNAME").unwrap_or_else(|_| "root".to_string()),
            password: env::var("ARANGO_PASSWORD").unwrap_or_default(),
            records_collection: records_collection.clone(),
        };
        let record_store = ArangoRecordStore::new(arango_config)
            .map_err(|e| IndexerError::config(format!("Failed to create ArangoDB client: {}", e)))?;

        info!("ArangoDB client created");

        let provider_tag = env::var("EMBEDDING_PROVIDER")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_PROVIDER.to_string());
        let embedding_config = EmbeddingConfig {
            base_url: env::var("EMBEDDING_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_BASE_URL.to_string()),
            api_key: env::var("EMBEDDING_API_KEY").ok(),
            model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
        };
        let embeddings = embedding_provider_from_tag(&provider_tag, embedding_config)
            .map_err(|e| IndexerError::config(format!("Failed to create embedding provider: {}", e)))?;

        info!(provider = %provider_tag, "Embedding provider created");

        let pipeline_config = IndexingPipelineConfig::new(chunks_collection, records_collection);
        let pipeline = IndexingPipeline::new(
            Arc::new(vector_store),
            Arc::new(record_store),
            embeddings,
            pipeline_config,
        );

        Ok(Self { pipeline })
    }
}
