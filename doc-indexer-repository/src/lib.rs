//! # Doc Indexer Repository
//!
//! This crate provides traits and implementations for the external systems
//! the indexing pipeline talks to: the vector store, the record database,
//! and the embedding provider. It includes definitions for errors,
//! interfaces, and concrete REST-backed implementations.

pub mod arango;
pub mod embeddings;
pub mod errors;
pub mod interfaces;
pub mod qdrant;
pub mod types;

pub use arango::{ArangoConfig, ArangoRecordStore};
pub use embeddings::{embedding_provider_from_tag, EmbeddingConfig, OpenAiEmbeddings};
pub use errors::{EmbeddingError, RecordStoreError, VectorStoreError};
pub use interfaces::{probe_dimension, EmbeddingProvider, RecordStore, VectorStore};
pub use qdrant::QdrantRestStore;
pub use types::{CollectionInfo, CollectionSpec, PayloadFilter, VectorPoint};
