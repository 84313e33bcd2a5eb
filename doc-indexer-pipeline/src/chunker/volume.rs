//! Chunk count optimization for oversized documents.

use tracing::{info, instrument, warn};

use crate::chunker::metadata::merge_chunks;
use crate::errors::IndexingError;
use doc_indexer_shared::Chunk;

/// Conservative chunk count limit to prevent memory issues during semantic
/// merging.
pub const DEFAULT_MAX_CHUNKS: usize = 800;

/// Pre-merges chunk counts for oversized documents.
///
/// Sequential groups of roughly `count / cap` chunks are merged before the
/// semantic pass so peak memory stays bounded. The group size carries a
/// small positional offset (0-2) to avoid uniform seams. This stage must
/// never block ingestion: any internal failure falls back to the unmodified
/// input.
#[derive(Debug, Clone)]
pub struct VolumeOptimizer {
    cap: usize,
}

impl VolumeOptimizer {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    /// Bound the chunk count to roughly the configured cap.
    ///
    /// No-op when the input is already within the cap.
    #[instrument(skip(self, chunks), fields(chunk_count = chunks.len(), cap = self.cap))]
    pub fn optimize(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let count = chunks.len();
        if count <= self.cap {
            return chunks;
        }

        warn!(count = count, cap = self.cap, "Large document detected, merging down chunk count");

        match self.merge_down(&chunks) {
            Ok(optimized) => {
                let reduction_pct =
                    ((count - optimized.len()) as f64 / count as f64) * 100.0;
                info!(
                    before = count,
                    after = optimized.len(),
                    reduction_pct = reduction_pct,
                    "Chunk count optimization complete"
                );
                optimized
            }
            Err(e) => {
                warn!(error = %e, "Failed to optimize chunk count, using original");
                chunks
            }
        }
    }

    fn merge_down(&self, chunks: &[Chunk]) -> Result<Vec<Chunk>, IndexingError> {
        let merge_ratio = chunks.len() as f64 / self.cap as f64;
        let target_group_size = merge_ratio as usize + 1;

        let mut optimized = Vec::new();
        let mut i = 0;

        while i < chunks.len() {
            // Positional offset breaks up rigid group boundaries.
            let group_size = (target_group_size + (i % 3)).min(chunks.len() - i);
            let group = &chunks[i..i + group_size];

            if group.len() == 1 {
                optimized.push(group[0].clone());
            } else {
                optimized.push(merge_chunks(group)?);
            }

            i += group_size;
        }

        Ok(optimized)
    }
}

impl Default for VolumeOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNKS)
    }
}
