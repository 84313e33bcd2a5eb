//! Request and response types shared by the repository interfaces.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A single point to be written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Point id; a UUID string so re-indexing overwrites deterministically.
    pub id: String,
    /// Dense embedding vector.
    pub vector: Vec<f32>,
    /// Payload stored alongside the vector.
    pub payload: Map<String, Value>,
}

/// Configured dimensionality of an existing collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Size of the dense vector, if the collection has one configured.
    pub dense_size: Option<u64>,
}

/// Parameters for creating a collection.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    /// Dense vector dimensionality, taken from the current embedding model.
    pub dense_size: u64,
    /// Whether the sparse vector index applies an IDF modifier.
    pub sparse_idf: bool,
    /// Optimizer default segment number.
    pub segment_number: u64,
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self {
            dense_size: 1024,
            sparse_idf: false,
            segment_number: 8,
        }
    }
}

impl CollectionSpec {
    pub fn with_dense_size(dense_size: u64) -> Self {
        Self {
            dense_size,
            ..Self::default()
        }
    }
}

/// A keyword match filter over a single payload field.
///
/// This is the only filter shape the pipeline needs: every scoped operation
/// (back-fill, scroll, delete) addresses points by their shared
/// virtualRecordId.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFilter {
    pub key: String,
    pub value: String,
}

impl PayloadFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Filter on the virtual record id payload field.
    pub fn virtual_record(virtual_record_id: impl Into<String>) -> Self {
        Self::new("metadata.virtualRecordId", virtual_record_id)
    }

    /// Render as a Qdrant filter body.
    pub fn to_qdrant(&self) -> Value {
        json!({
            "must": [
                { "key": self.key, "match": { "value": self.value } }
            ]
        })
    }
}
