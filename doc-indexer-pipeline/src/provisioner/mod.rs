//! Collection provisioning for the vector store.
//!
//! Ensures the target collection exists with a dense vector size matching
//! the configured embedding model, recreating it when the model changed
//! dimension since the collection was created.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::errors::IndexingError;
use doc_indexer_repository::{probe_dimension, CollectionSpec, EmbeddingProvider, VectorStore};

/// Payload fields that get a keyword index for fast filtered deletes and
/// lookups.
const INDEXED_PAYLOAD_FIELDS: &[&str] = &[
    "metadata.virtualRecordId",
    "metadata.orgId",
    // the aircraft back-fill writes this at the payload root
    "aircraft_canonical",
];

/// Creates or recreates the chunk collection to match the embedding model.
pub struct CollectionProvisioner {
    vector_store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl CollectionProvisioner {
    pub fn new(vector_store: Arc<dyn VectorStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            vector_store,
            embeddings,
        }
    }

    /// Make sure the collection exists with the model's dense vector size.
    ///
    /// A collection whose dense size differs from the model is deleted and
    /// recreated; its points are lost, which is acceptable because chunks
    /// embedded under the old model cannot be searched with the new one
    /// anyway.
    #[instrument(skip(self))]
    pub async fn ensure_collection(&self, collection: &str) -> Result<(), IndexingError> {
        let dimension = probe_dimension(self.embeddings.as_ref()).await? as u64;
        let spec = CollectionSpec::with_dense_size(dimension);

        match self.vector_store.get_collection(collection).await? {
            Some(info) => {
                if info.dense_size == Some(dimension) {
                    return Ok(());
                }
                warn!(
                    collection = %collection,
                    existing = ?info.dense_size,
                    required = dimension,
                    "Dense vector size mismatch, recreating collection"
                );
                self.vector_store.delete_collection(collection).await?;
                self.vector_store.create_collection(collection, &spec).await?;
            }
            None => {
                info!(collection = %collection, dimension = dimension, "Creating collection");
                self.vector_store.create_collection(collection, &spec).await?;
            }
        }

        self.create_payload_indexes(collection).await;
        Ok(())
    }

    /// Payload indexes are an optimization; failing to create one must not
    /// block indexing.
    async fn create_payload_indexes(&self, collection: &str) {
        for field in INDEXED_PAYLOAD_FIELDS {
            if let Err(e) = self
                .vector_store
                .create_payload_index(collection, field)
                .await
            {
                warn!(field = %field, error = %e, "Failed to create payload index");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use doc_indexer_repository::{
        CollectionInfo, EmbeddingError, PayloadFilter, VectorPoint, VectorStoreError,
    };
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbeddings {
        dimension: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddings {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct MockStore {
        existing: Option<CollectionInfo>,
        deletes: AtomicUsize,
        creates: AtomicUsize,
        index_creates: AtomicUsize,
        index_fails: bool,
    }

    impl MockStore {
        fn with_existing(dense_size: Option<u64>) -> Self {
            Self {
                existing: Some(CollectionInfo { dense_size }),
                deletes: AtomicUsize::new(0),
                creates: AtomicUsize::new(0),
                index_creates: AtomicUsize::new(0),
                index_fails: false,
            }
        }

        fn empty() -> Self {
            Self {
                existing: None,
                deletes: AtomicUsize::new(0),
                creates: AtomicUsize::new(0),
                index_creates: AtomicUsize::new(0),
                index_fails: false,
            }
        }
    }

    #[async_trait]
    impl VectorStore for MockStore {
        async fn get_collection(
            &self,
            _name: &str,
        ) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(self.existing.clone())
        }

        async fn create_collection(
            &self,
            _name: &str,
            spec: &CollectionSpec,
        ) -> Result<(), VectorStoreError> {
            assert_eq!(spec.dense_size, 768);
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_collection(&self, _name: &str) -> Result<(), VectorStoreError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create_payload_index(
            &self,
            _name: &str,
            _field: &str,
        ) -> Result<(), VectorStoreError> {
            self.index_creates.fetch_add(1, Ordering::SeqCst);
            if self.index_fails {
                Err(VectorStoreError::collection("index creation unsupported"))
            } else {
                Ok(())
            }
        }

        async fn upsert_points(
            &self,
            _name: &str,
            _points: Vec<VectorPoint>,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn set_payload(
            &self,
            _name: &str,
            _filter: &PayloadFilter,
            _payload: Map<String, Value>,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn scroll_ids(
            &self,
            _name: &str,
            _filter: &PayloadFilter,
        ) -> Result<Vec<String>, VectorStoreError> {
            Ok(Vec::new())
        }

        async fn delete_points(
            &self,
            _name: &str,
            _ids: &[String],
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }
    }

    fn provisioner(store: Arc<MockStore>) -> CollectionProvisioner {
        CollectionProvisioner::new(store, Arc::new(FixedEmbeddings { dimension: 768 }))
    }

    #[tokio::test]
    async fn test_matching_collection_left_alone() {
        let store = Arc::new(MockStore::with_existing(Some(768)));

        provisioner(store.clone())
            .ensure_collection("chunks")
            .await
            .unwrap();

        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mismatched_collection_recreated() {
        let store = Arc::new(MockStore::with_existing(Some(1536)));

        provisioner(store.clone())
            .ensure_collection("chunks")
            .await
            .unwrap();

        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(store.index_creates.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_collection_created() {
        let store = Arc::new(MockStore::empty());

        provisioner(store.clone())
            .ensure_collection("chunks")
            .await
            .unwrap();

        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_index_failures_are_non_fatal() {
        let mut mock = MockStore::empty();
        mock.index_fails = true;
        let store = Arc::new(mock);

        provisioner(store.clone())
            .ensure_collection("chunks")
            .await
            .unwrap();

        assert_eq!(store.index_creates.load(Ordering::SeqCst), 3);
    }
}
