//! Vector store error types.

use thiserror::Error;

/// Errors that can occur during vector store operations.
#[derive(Debug, Clone, Error)]
pub enum VectorStoreError {
    /// Failed to reach the vector store at all.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Collection create/get/delete failed.
    #[error("Collection error: {0}")]
    CollectionError(String),

    /// Writing points or payload failed.
    #[error("Write error: {0}")]
    WriteError(String),

    /// Scroll or filtered read failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Deleting points failed.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// The store returned a body we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl VectorStoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a collection error.
    pub fn collection(msg: impl Into<String>) -> Self {
        Self::CollectionError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
