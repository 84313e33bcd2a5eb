//! Error types for the indexing pipeline.

use doc_indexer_repository::{EmbeddingError, RecordStoreError, VectorStoreError};
use doc_indexer_shared::DocumentError;
use thiserror::Error;

/// Errors that can occur in the indexing pipeline.
///
/// Typed failure kinds map onto pipeline stages so callers can tell a
/// chunking fault from a storage fault; the source error type is preserved
/// through `#[from]` conversions for diagnostics.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Failure while merging segments into chunks. Aborts the call with no
    /// partial results.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// Failure while processing or merging metadata.
    #[error("Metadata error: {0}")]
    MetadataError(String),

    /// A batch could not be stored after exhausting retries.
    #[error("Storage error for {batch} after {attempts} attempts: {message}")]
    StorageError {
        batch: String,
        attempts: u32,
        message: String,
    },

    /// Failure updating the source record.
    #[error("Document processing error: {message}")]
    DocumentProcessingError {
        record_id: Option<String>,
        message: String,
    },

    /// Failure during the embedding deletion path.
    #[error("Deletion error for record {record_id}: {message}")]
    DeletionError { record_id: String, message: String },

    /// Error from the embedding provider.
    #[error("Embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    /// Error from the vector store.
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    /// Error from the record store.
    #[error("Record store error: {0}")]
    RecordStoreError(#[from] RecordStoreError),

    /// Catch-all for unexpected failures, preserving the message.
    #[error("Indexing error: {0}")]
    Other(String),
}

impl IndexingError {
    /// Create a chunking error.
    pub fn chunking(msg: impl Into<String>) -> Self {
        Self::ChunkingError(msg.into())
    }

    /// Create a metadata error.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::MetadataError(msg.into())
    }

    /// Create a storage error naming the batch and attempt count.
    pub fn storage(batch: impl Into<String>, attempts: u32, msg: impl Into<String>) -> Self {
        Self::StorageError {
            batch: batch.into(),
            attempts,
            message: msg.into(),
        }
    }

    /// Create a document processing error.
    pub fn document(record_id: Option<String>, msg: impl Into<String>) -> Self {
        Self::DocumentProcessingError {
            record_id,
            message: msg.into(),
        }
    }

    /// Create a deletion error.
    pub fn deletion(record_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::DeletionError {
            record_id: record_id.into(),
            message: msg.into(),
        }
    }

    /// Create a catch-all error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<DocumentError> for IndexingError {
    fn from(err: DocumentError) -> Self {
        Self::MetadataError(err.to_string())
    }
}
