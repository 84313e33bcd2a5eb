//! Record store trait definition.
//!
//! The record database is the system of record for source documents; the
//! pipeline reads records back and reconciles their indexing status.

use async_trait::async_trait;

use crate::errors::RecordStoreError;
use doc_indexer_shared::Record;

/// Abstracts the record database (ArangoDB in production).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record document by key.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Record))` - The record exists
    /// * `Ok(None)` - No record with that key
    /// * `Err(RecordStoreError)` - If the lookup fails
    async fn get_document(
        &self,
        id: &str,
        collection: &str,
    ) -> Result<Option<Record>, RecordStoreError>;

    /// Upsert a batch of record documents by key.
    async fn batch_upsert(
        &self,
        docs: Vec<Record>,
        collection: &str,
    ) -> Result<(), RecordStoreError>;

    /// Return the keys of all records sharing the given virtual record id.
    ///
    /// Used by the deletion path to decide whether embeddings are still
    /// referenced by another physical record.
    async fn records_sharing_virtual_id(
        &self,
        virtual_record_id: &str,
    ) -> Result<Vec<String>, RecordStoreError>;
}
