//! Error types for repository operations.

mod embedding_error;
mod record_store_error;
mod vector_store_error;

pub use embedding_error::EmbeddingError;
pub use record_store_error::RecordStoreError;
pub use vector_store_error::VectorStoreError;
