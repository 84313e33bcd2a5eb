//! # Doc Indexer Pipeline
//!
//! This crate provides the components that turn parsed document segments
//! into stored embeddings and reconciled record status.
//!
//! ## Architecture
//!
//! The pipeline runs the following stages in order:
//!
//! 1. **Reconciler**: normalizes per-segment metadata into the fixed schema
//! 2. **Chunker**: bounds chunk counts for oversized documents, then merges
//!    semantically adjacent segments into chunks
//! 3. **Advisor**: recommends a processing strategy and batch size
//! 4. **Provisioner**: ensures the destination collection matches the
//!    embedding dimensionality
//! 5. **Executor**: embeds and stores chunks in fault-tolerant batches
//! 6. **Recorder**: back-fills scoping tags and marks the record complete

pub mod advisor;
pub mod chunker;
pub mod errors;
pub mod executor;
pub mod pipeline;
pub mod provisioner;
pub mod reconciler;
pub mod recorder;

pub use errors::IndexingError;
pub use pipeline::{IndexingPipeline, IndexingPipelineConfig};
