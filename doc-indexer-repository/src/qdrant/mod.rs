//! Qdrant REST implementation of the vector store interface.

mod client;
mod collection_config;

pub use client::QdrantRestStore;
pub use collection_config::collection_body;
