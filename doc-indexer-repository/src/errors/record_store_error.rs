//! Record store error types.

use thiserror::Error;

/// Errors that can occur when talking to the record database.
#[derive(Debug, Clone, Error)]
pub enum RecordStoreError {
    /// Failed to reach the record database.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query for records failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Upsert of records failed.
    #[error("Upsert error: {0}")]
    UpsertError(String),

    /// The store returned a body we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RecordStoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create an upsert error.
    pub fn upsert(msg: impl Into<String>) -> Self {
        Self::UpsertError(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
