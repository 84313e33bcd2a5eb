//! # Doc Indexer Shared
//!
//! Shared types and data structures for the document indexing system.
//!
//! This crate defines the data model that flows through the ingestion
//! pipeline: raw [`Segment`]s arrive from the parser, are reconciled into
//! [`EnhancedMetadata`], merged into [`Chunk`]s, and finally persisted as
//! vector-store points while the owning [`Record`] status is updated.

pub mod document;
pub mod metadata;
pub mod record;

pub use document::{BoxPoint, Chunk, DocumentError, Segment};
pub use metadata::EnhancedMetadata;
pub use record::{epoch_millis_now, Record, RecordStatus};
