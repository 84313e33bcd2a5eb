//! ArangoDB REST implementation of the record store interface.

mod client;

pub use client::{ArangoConfig, ArangoRecordStore};
