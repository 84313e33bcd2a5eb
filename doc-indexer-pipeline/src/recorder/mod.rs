//! Post-indexing reconciliation with the record database.
//!
//! After embeddings are stored, the record document is updated to reflect
//! completion, aircraft metadata extracted during chunking is back-filled
//! onto the stored points, and the deletion path removes embeddings only
//! when no other record still references them.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};

use crate::errors::IndexingError;
use doc_indexer_repository::{PayloadFilter, RecordStore, VectorStore};
use doc_indexer_shared::{epoch_millis_now, RecordStatus};

/// Reconciles record status and embedding lifecycle after a run.
pub struct CompletionRecorder {
    vector_store: Arc<dyn VectorStore>,
    record_store: Arc<dyn RecordStore>,
    collection: String,
    records_collection: String,
}

impl CompletionRecorder {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        record_store: Arc<dyn RecordStore>,
        collection: impl Into<String>,
        records_collection: impl Into<String>,
    ) -> Self {
        Self {
            vector_store,
            record_store,
            collection: collection.into(),
            records_collection: records_collection.into(),
        }
    }

    /// Back-fill aircraft metadata onto every stored point of a document.
    ///
    /// Aircraft normalization runs per-chunk during reconciliation, but the
    /// authoritative value is only known once the whole document has been
    /// seen. Failure here degrades filtering, not indexing, so it is logged
    /// and swallowed.
    #[instrument(skip(self, aliases))]
    pub async fn backfill_aircraft(
        &self,
        virtual_record_id: &str,
        canonical: &str,
        aliases: &[String],
    ) {
        let mut payload = Map::new();
        payload.insert("aircraft_canonical".to_string(), json!(canonical));
        payload.insert("aircraft_aliases".to_string(), json!(aliases));

        let filter = PayloadFilter::virtual_record(virtual_record_id);
        if let Err(e) = self
            .vector_store
            .set_payload(&self.collection, &filter, payload)
            .await
        {
            warn!(
                virtual_record_id = %virtual_record_id,
                error = %e,
                "Failed to back-fill aircraft metadata"
            );
        }
    }

    /// Mark a record as fully indexed.
    ///
    /// Reads the current record document, stamps it COMPLETED with a fresh
    /// index timestamp, and writes it back. A missing record is an error:
    /// it means the document was deleted mid-run and the stored embeddings
    /// are orphaned.
    #[instrument(skip(self))]
    pub async fn mark_completed(
        &self,
        record_id: &str,
        virtual_record_id: &str,
    ) -> Result<(), IndexingError> {
        let mut record = self
            .record_store
            .get_document(record_id, &self.records_collection)
            .await?
            .ok_or_else(|| {
                IndexingError::document(
                    Some(record_id.to_string()),
                    "record disappeared before completion could be recorded",
                )
            })?;

        record.insert(
            "indexingStatus".to_string(),
            json!(RecordStatus::Completed.as_str()),
        );
        record.insert("isDirty".to_string(), json!(false));
        record.insert("lastIndexTimestamp".to_string(), json!(epoch_millis_now()));
        record.insert(
            "virtualRecordId".to_string(),
            json!(virtual_record_id),
        );

        self.record_store
            .batch_upsert(vec![record], &self.records_collection)
            .await?;

        info!(record_id = %record_id, "Marked record as indexed");
        Ok(())
    }

    /// Delete a record's embeddings unless another record still shares them.
    ///
    /// Records produced from the same source content share a virtual record
    /// id and therefore share points in the vector store. Deleting one such
    /// record must leave the points in place for the survivors.
    #[instrument(skip(self))]
    pub async fn delete_embeddings(
        &self,
        record_id: &str,
        virtual_record_id: &str,
    ) -> Result<(), IndexingError> {
        if record_id.is_empty() {
            return Err(IndexingError::deletion(
                record_id,
                "record id must not be empty",
            ));
        }

        let sharing = self
            .record_store
            .records_sharing_virtual_id(virtual_record_id)
            .await?;
        let others: Vec<&String> = sharing.iter().filter(|key| *key != record_id).collect();

        if !others.is_empty() {
            info!(
                record_id = %record_id,
                virtual_record_id = %virtual_record_id,
                shared_by = others.len(),
                "Embeddings still referenced by other records, skipping deletion"
            );
            return Ok(());
        }

        let filter = PayloadFilter::virtual_record(virtual_record_id);
        let ids = self
            .vector_store
            .scroll_ids(&self.collection, &filter)
            .await?;

        if ids.is_empty() {
            info!(virtual_record_id = %virtual_record_id, "No embeddings found to delete");
            return Ok(());
        }

        self.vector_store
            .delete_points(&self.collection, &ids)
            .await?;
        info!(
            record_id = %record_id,
            deleted = ids.len(),
            "Deleted embeddings"
        );
        Ok(())
    }

    /// Whether any embeddings exist for the given virtual record id.
    pub async fn embeddings_exist(&self, virtual_record_id: &str) -> Result<bool, IndexingError> {
        let filter = PayloadFilter::virtual_record(virtual_record_id);
        let ids = self
            .vector_store
            .scroll_ids(&self.collection, &filter)
            .await?;
        Ok(!ids.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use doc_indexer_repository::{
        CollectionInfo, CollectionSpec, RecordStoreError, VectorPoint, VectorStoreError,
    };
    use doc_indexer_shared::Record;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockVectors {
        point_ids: Vec<String>,
        deleted: Mutex<Vec<String>>,
        payload_sets: AtomicUsize,
        set_payload_fails: bool,
    }

    impl MockVectors {
        fn with_points(ids: &[&str]) -> Self {
            Self {
                point_ids: ids.iter().map(|s| s.to_string()).collect(),
                deleted: Mutex::new(Vec::new()),
                payload_sets: AtomicUsize::new(0),
                set_payload_fails: false,
            }
        }
    }

    #[async_trait]
    impl VectorStore for MockVectors {
        async fn get_collection(
            &self,
            _name: &str,
        ) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(None)
        }

        async fn create_collection(
            &self,
            _name: &str,
            _spec: &CollectionSpec,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn delete_collection(&self, _name: &str) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn create_payload_index(
            &self,
            _name: &str,
            _field: &str,
        ) -> Result<(), VectorStoreError> {
            Ok(())
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
            self.payload_sets.fetch_add(1, Ordering::SeqCst);
            if self.set_payload_fails {
                Err(VectorStoreError::write("payload update rejected"))
            } else {
                Ok(())
            }
        }

        async fn scroll_ids(
            &self,
            _name: &str,
            _filter: &PayloadFilter,
        ) -> Result<Vec<String>, VectorStoreError> {
            Ok(self.point_ids.clone())
        }

        async fn delete_points(
            &self,
            _name: &str,
            ids: &[String],
        ) -> Result<(), VectorStoreError> {
            self.deleted.lock().unwrap().extend(ids.iter().cloned());
            Ok(())
        }
    }

    struct MockRecords {
        document: Option<Record>,
        sharing: Vec<String>,
        upserted: Mutex<Vec<Record>>,
    }

    impl MockRecords {
        fn sharing(keys: &[&str]) -> Self {
            Self {
                document: None,
                sharing: keys.iter().map(|s| s.to_string()).collect(),
                upserted: Mutex::new(Vec::new()),
            }
        }

        fn with_document(doc: Record) -> Self {
            Self {
                document: Some(doc),
                sharing: Vec::new(),
                upserted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecordStore for MockRecords {
        async fn get_document(
            &self,
            _id: &str,
            _collection: &str,
        ) -> Result<Option<Record>, RecordStoreError> {
            Ok(self.document.clone())
        }

        async fn batch_upsert(
            &self,
            docs: Vec<Record>,
            _collection: &str,
        ) -> Result<(), RecordStoreError> {
            self.upserted.lock().unwrap().extend(docs);
            Ok(())
        }

        async fn records_sharing_virtual_id(
            &self,
            _virtual_record_id: &str,
        ) -> Result<Vec<String>, RecordStoreError> {
            Ok(self.sharing.clone())
        }
    }

    fn recorder(vectors: Arc<MockVectors>, records: Arc<MockRecords>) -> CompletionRecorder {
        CompletionRecorder::new(vectors, records, "chunks", "records")
    }

    #[tokio::test]
    async fn test_deletion_skipped_when_virtual_id_shared() {
        let vectors = Arc::new(MockVectors::with_points(&["p1", "p2"]));
        let records = Arc::new(MockRecords::sharing(&["rec-1", "rec-2"]));

        recorder(vectors.clone(), records)
            .delete_embeddings("rec-1", "v-1")
            .await
            .unwrap();

        assert!(vectors.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deletion_removes_points_for_sole_owner() {
        let vectors = Arc::new(MockVectors::with_points(&["p1", "p2"]));
        let records = Arc::new(MockRecords::sharing(&["rec-1"]));

        recorder(vectors.clone(), records)
            .delete_embeddings("rec-1", "v-1")
            .await
            .unwrap();

        assert_eq!(*vectors.deleted.lock().unwrap(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_deletion_rejects_empty_record_id() {
        let vectors = Arc::new(MockVectors::with_points(&[]));
        let records = Arc::new(MockRecords::sharing(&[]));

        let err = recorder(vectors, records)
            .delete_embeddings("", "v-1")
            .await
            .unwrap_err();

        assert!(matches!(err, IndexingError::DeletionError { .. }));
    }

    #[tokio::test]
    async fn test_mark_completed_stamps_record() {
        let mut doc = Record::new();
        doc.insert("_key".to_string(), json!("rec-1"));
        doc.insert("recordName".to_string(), json!("manual.pdf"));
        let vectors = Arc::new(MockVectors::with_points(&[]));
        let records = Arc::new(MockRecords::with_document(doc));

        recorder(vectors, records.clone())
            .mark_completed("rec-1", "v-1")
            .await
            .unwrap();

        let upserted = records.upserted.lock().unwrap();
        assert_eq!(upserted.len(), 1);
        let rec = &upserted[0];
        assert_eq!(rec.get("indexingStatus"), Some(&json!("COMPLETED")));
        assert_eq!(rec.get("isDirty"), Some(&json!(false)));
        assert_eq!(rec.get("virtualRecordId"), Some(&json!("v-1")));
        assert_eq!(rec.get("recordName"), Some(&json!("manual.pdf")));
        assert!(rec.get("lastIndexTimestamp").is_some());
    }

    #[tokio::test]
    async fn test_mark_completed_fails_for_missing_record() {
        let vectors = Arc::new(MockVectors::with_points(&[]));
        let records = Arc::new(MockRecords::sharing(&[]));

        let err = recorder(vectors, records)
            .mark_completed("rec-gone", "v-1")
            .await
            .unwrap_err();

        assert!(matches!(err, IndexingError::DocumentProcessingError { .. }));
    }

    #[tokio::test]
    async fn test_backfill_failure_is_swallowed() {
        let mut mock = MockVectors::with_points(&[]);
        mock.set_payload_fails = true;
        let vectors = Arc::new(mock);
        let records = Arc::new(MockRecords::sharing(&[]));

        recorder(vectors.clone(), records)
            .backfill_aircraft("v-1", "A320", &["a320neo".to_string()])
            .await;

        assert_eq!(vectors.payload_sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_embeddings_exist() {
        let vectors = Arc::new(MockVectors::with_points(&["p1"]));
        let records = Arc::new(MockRecords::sharing(&[]));

        let exists = recorder(vectors, records)
            .embeddings_exist("v-1")
            .await
            .unwrap();

        assert!(exists);
    }

    #[tokio::test]
    async fn test_embeddings_exist_false_when_no_points() {
        let vectors = Arc::new(MockVectors::with_points(&[]));
        let records = Arc::new(MockRecords::sharing(&[]));

        let exists = recorder(vectors, records)
            .embeddings_exist("v-1")
            .await
            .unwrap();

        assert!(!exists);
    }
}
