//! Repository trait definitions.
//!
//! These traits abstract the external collaborators of the pipeline so
//! implementations can be swapped and tests can inject mocks.

mod embedding_provider;
mod record_store;
mod vector_store;

pub use embedding_provider::{probe_dimension, EmbeddingProvider};
pub use record_store::RecordStore;
pub use vector_store::VectorStore;
