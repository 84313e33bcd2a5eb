//! Semantic breakpoint detection and run merging.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::chunker::metadata::merge_chunks;
use crate::errors::IndexingError;
use doc_indexer_repository::EmbeddingProvider;
use doc_indexer_shared::Chunk;

/// Default breakpoint threshold percentile over adjacent distances.
const DEFAULT_BREAKPOINT_PERCENTILE: f64 = 95.0;

/// Merges runs of semantically adjacent chunks.
///
/// Adjacent chunks are embedded and the cosine distance between neighbours
/// is compared against a breakpoint threshold: a percentile of the distance
/// distribution, or a cluster-count-driven percentile when a target chunk
/// count is configured. Maximal runs between breakpoints merge into one
/// chunk each.
///
/// Any stage failure raises a chunking fault that aborts the call; no
/// partial results are returned.
pub struct BoundaryMerger {
    embeddings: Arc<dyn EmbeddingProvider>,
    breakpoint_percentile: f64,
    target_chunk_count: Option<usize>,
}

impl BoundaryMerger {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embeddings,
            breakpoint_percentile: DEFAULT_BREAKPOINT_PERCENTILE,
            target_chunk_count: None,
        }
    }

    /// Derive the threshold from a target number of output chunks instead
    /// of a fixed percentile.
    pub fn with_target_chunk_count(mut self, count: usize) -> Self {
        self.target_chunk_count = Some(count);
        self
    }

    /// Merge chunks at semantic boundaries.
    ///
    /// Inputs with fewer than two chunks are returned unchanged. Every
    /// input chunk ends up in exactly one output chunk.
    #[instrument(skip(self, chunks), fields(chunk_count = chunks.len()))]
    pub async fn merge(&self, chunks: Vec<Chunk>) -> Result<Vec<Chunk>, IndexingError> {
        if chunks.len() <= 1 {
            return Ok(chunks);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed(&texts).await.map_err(|e| {
            IndexingError::chunking(format!("failed to calculate segment distances: {}", e))
        })?;

        if vectors.len() != chunks.len() {
            return Err(IndexingError::chunking(format!(
                "expected {} embeddings for distance calculation, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let distances: Vec<f64> = vectors
            .windows(2)
            .map(|pair| cosine_distance(&pair[0], &pair[1]))
            .collect();

        let threshold = match self.target_chunk_count {
            Some(target) => threshold_from_cluster_count(&distances, target),
            None => percentile(&distances, self.breakpoint_percentile),
        };

        let breakpoints: Vec<usize> = distances
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > threshold)
            .map(|(i, _)| i)
            .collect();

        debug!(
            threshold = threshold,
            breakpoint_count = breakpoints.len(),
            "Derived breakpoint threshold"
        );

        let mut merged = Vec::with_capacity(breakpoints.len() + 1);
        let mut start = 0;

        for index in breakpoints {
            merged.push(merge_chunks(&chunks[start..=index])?);
            start = index + 1;
        }
        if start < chunks.len() {
            merged.push(merge_chunks(&chunks[start..])?);
        }

        debug!(merged_count = merged.len(), "Merged chunk runs");
        Ok(merged)
    }
}

/// Cosine distance between two vectors; orthogonal or degenerate inputs
/// yield the maximum distance of 1.0.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += (*x as f64) * (*y as f64);
        norm_a += (*x as f64) * (*x as f64);
        norm_b += (*y as f64) * (*y as f64);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Linear-interpolated percentile of a non-empty sample.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Map a target chunk count onto a percentile of the distance distribution.
///
/// A target of one chunk maps to the 100th percentile (merge everything), a
/// target equal to the number of gaps maps to the 0th percentile (split at
/// every gap); targets in between interpolate linearly.
fn threshold_from_cluster_count(distances: &[f64], target: usize) -> f64 {
    let x1 = distances.len() as f64;
    let x2 = 1.0;
    if (x1 - x2).abs() < f64::EPSILON {
        return percentile(distances, 100.0);
    }

    let x = (target as f64).clamp(x2, x1);
    let y = 100.0 * (x - x1) / (x2 - x1);
    percentile(distances, y.clamp(0.0, 100.0))
}
