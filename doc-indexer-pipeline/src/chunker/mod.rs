//! Chunk merging.
//!
//! Two cooperating passes produce the final chunks: the volume optimizer
//! pre-merges oversized documents to bound memory, then the boundary merger
//! joins semantically adjacent segments at detected breakpoints.

mod boundary;
mod metadata;
mod volume;

pub use boundary::BoundaryMerger;
pub use metadata::{merge_bounding_boxes, merge_chunks, merge_metadata};
pub use volume::{VolumeOptimizer, DEFAULT_MAX_CHUNKS};
