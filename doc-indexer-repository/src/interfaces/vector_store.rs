//! Vector store trait definition.
//!
//! This module defines the abstract interface for the vector database,
//! allowing for different backend implementations (Qdrant, etc.).

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::VectorStoreError;
use crate::types::{CollectionInfo, CollectionSpec, PayloadFilter, VectorPoint};

/// Abstracts the underlying vector database.
///
/// Implementations are injected into the pipeline to enable dependency
/// injection and easy testing with mock implementations. All methods return
/// `Result<T, VectorStoreError>` for consistent error handling.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Fetch the configuration of a collection.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CollectionInfo))` - The collection exists
    /// * `Ok(None)` - The collection does not exist
    /// * `Err(VectorStoreError)` - If the lookup fails
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create a collection with the given spec.
    async fn create_collection(
        &self,
        name: &str,
        spec: &CollectionSpec,
    ) -> Result<(), VectorStoreError>;

    /// Delete a collection. Deleting a missing collection is not an error.
    async fn delete_collection(&self, name: &str) -> Result<(), VectorStoreError>;

    /// Create a keyword payload index on a field.
    async fn create_payload_index(&self, name: &str, field: &str) -> Result<(), VectorStoreError>;

    /// Write a batch of points. Existing points with the same id are
    /// replaced.
    async fn upsert_points(
        &self,
        name: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorStoreError>;

    /// Set payload fields on every point matching the filter.
    async fn set_payload(
        &self,
        name: &str,
        filter: &PayloadFilter,
        payload: Map<String, Value>,
    ) -> Result<(), VectorStoreError>;

    /// Scroll all point ids matching the filter.
    async fn scroll_ids(
        &self,
        name: &str,
        filter: &PayloadFilter,
    ) -> Result<Vec<String>, VectorStoreError>;

    /// Delete points by id.
    async fn delete_points(&self, name: &str, ids: &[String]) -> Result<(), VectorStoreError>;
}
