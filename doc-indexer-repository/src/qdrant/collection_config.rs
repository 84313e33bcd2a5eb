//! Qdrant collection configuration.
//!
//! This module defines the collection body used when provisioning the
//! embedding collection.

use serde_json::{json, Value};

use crate::types::CollectionSpec;

/// Name of the dense vector within each point.
pub const DENSE_VECTOR_NAME: &str = "dense";

/// Name of the sparse vector within each point.
pub const SPARSE_VECTOR_NAME: &str = "sparse";

/// Build the collection creation body.
///
/// The configuration includes:
/// - A named dense vector with cosine distance, sized to the current
///   embedding model
/// - A named sparse vector with an in-memory index and optional IDF modifier
/// - Scalar int8 quantization (quantile 0.95, kept in RAM)
pub fn collection_body(spec: &CollectionSpec) -> Value {
    let mut body = json!({
        "vectors": {
            DENSE_VECTOR_NAME: {
                "size": spec.dense_size,
                "distance": "Cosine"
            }
        },
        "sparse_vectors": {
            SPARSE_VECTOR_NAME: {
                "index": { "on_disk": false }
            }
        },
        "optimizers_config": {
            "default_segment_number": spec.segment_number
        },
        "quantization_config": {
            "scalar": {
                "type": "int8",
                "quantile": 0.95,
                "always_ram": true
            }
        }
    });

    if spec.sparse_idf {
        body["sparse_vectors"][SPARSE_VECTOR_NAME]["modifier"] = json!("idf");
    }

    body
}
