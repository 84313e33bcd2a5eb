//! Memory strategy advisory.
//!
//! Sizes the processing strategy from document volume. Advisory only: the
//! caller must proceed with ingestion regardless of the recommended label.

use tracing::info;

/// Chunk count above which streaming is preferred.
const MAX_CHUNKS_FOR_BATCH: usize = 3_000;
/// Estimated size above which streaming is preferred.
const MAX_SIZE_MB_FOR_BATCH: f64 = 100.0;
/// Very large chunk count.
const CRITICAL_CHUNKS: usize = 60_000;
/// Very large estimated size.
const CRITICAL_SIZE_MB: f64 = 500.0;

/// Recommended processing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStrategy {
    /// Everything fits comfortably; process in plain batches.
    Batch,
    /// Large input; stream through conservative batches.
    Streaming,
}

/// Strategy recommendation for one document.
#[derive(Debug, Clone)]
pub struct MemoryAdvice {
    pub strategy: ProcessingStrategy,
    pub batch_size: usize,
    pub reason: String,
}

/// Assess memory requirements and recommend a strategy.
///
/// Never hard-blocks ingestion; every input maps to a workable
/// recommendation.
pub fn assess(chunk_count: usize, estimated_size_mb: f64) -> MemoryAdvice {
    let advice = if chunk_count > CRITICAL_CHUNKS || estimated_size_mb > CRITICAL_SIZE_MB {
        MemoryAdvice {
            strategy: ProcessingStrategy::Streaming,
            batch_size: 20,
            reason: format!(
                "Very large document: {} chunks, {:.1}MB. Using streaming with conservative batch size.",
                chunk_count, estimated_size_mb
            ),
        }
    } else if chunk_count > MAX_CHUNKS_FOR_BATCH || estimated_size_mb > MAX_SIZE_MB_FOR_BATCH {
        MemoryAdvice {
            strategy: ProcessingStrategy::Streaming,
            batch_size: if chunk_count > 500 { 30 } else { 50 },
            reason: format!(
                "Large document: {} chunks, {:.1}MB. Using streaming strategy.",
                chunk_count, estimated_size_mb
            ),
        }
    } else {
        MemoryAdvice {
            strategy: ProcessingStrategy::Batch,
            batch_size: 50,
            reason: format!(
                "Standard document: {} chunks, {:.1}MB. Using batch processing.",
                chunk_count, estimated_size_mb
            ),
        }
    };

    info!(
        chunk_count = chunk_count,
        estimated_size_mb = estimated_size_mb,
        strategy = ?advice.strategy,
        batch_size = advice.batch_size,
        "Memory strategy assessed"
    );

    advice
}
