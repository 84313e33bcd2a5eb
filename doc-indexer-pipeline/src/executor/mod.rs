//! Fault-tolerant batch embedding and storage.
//!
//! Drives embed+store over adaptive batches with per-batch retry, a
//! split-retry fallback, and a run-level circuit breaker. Batches partition
//! the chunks exhaustively and without overlap: either every chunk is
//! stored exactly once, or the whole run aborts with no partial success
//! reported upstream.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::IndexingError;
use doc_indexer_repository::{EmbeddingProvider, VectorPoint, VectorStore};
use doc_indexer_shared::Chunk;

/// Consecutive batch failures that trip the circuit breaker.
pub const MAX_BATCH_FAILURES: u32 = 3;

/// Retries per batch on top of the initial attempt.
const STORE_MAX_RETRIES: u32 = 2;

/// Average content length above which the batch size is halved.
const LONG_CONTENT_THRESHOLD: usize = 5000;

/// Lower bound on the halved batch size.
const MIN_BATCH_SIZE: usize = 10;

/// Circuit-breaker backoff cap.
const MAX_BACKOFF_SECS: f64 = 10.0;

/// Pause between successful batches so memory can settle.
const INTER_BATCH_PAUSE: Duration = Duration::from_millis(100);

/// Lifecycle of one executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Executes embed+store for a chunk list in sequential batches.
///
/// Batches run strictly sequentially to bound peak memory and respect
/// provider rate limits; embed+store within a batch is one awaited external
/// call chain. Already-written batches are not rolled back on abort, so the
/// caller must treat any failure as "retry the whole document".
pub struct BatchEmbeddingExecutor {
    vector_store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    collection: String,
    state: ExecutorState,
}

impl BatchEmbeddingExecutor {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            vector_store,
            embeddings,
            collection: collection.into(),
            state: ExecutorState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Embed and store all chunks.
    ///
    /// On a batch failure the run-level failure counter increments; the
    /// batch is then re-attempted through a one-level split-retry, and a
    /// failing split counts as another strike. Three consecutive strikes
    /// abort the run and no further batches are attempted.
    #[instrument(skip(self, chunks), fields(chunk_count = chunks.len()))]
    pub async fn run(
        &mut self,
        chunks: &[Chunk],
        advised_batch_size: usize,
    ) -> Result<(), IndexingError> {
        self.state = ExecutorState::Running;

        if chunks.is_empty() {
            self.state = ExecutorState::Completed;
            return Ok(());
        }

        let batch_size = effective_batch_size(chunks, advised_batch_size);
        let num_batches = chunks.len().div_ceil(batch_size);
        info!(
            total_chunks = chunks.len(),
            batch_size = batch_size,
            num_batches = num_batches,
            "Starting batch processing"
        );

        let mut consecutive_failures: u32 = 0;

        for batch_idx in 0..num_batches {
            let start = batch_idx * batch_size;
            let end = (start + batch_size).min(chunks.len());
            let batch = &chunks[start..end];
            let label = format!(
                "batch {}/{} ({} chunks)",
                batch_idx + 1,
                num_batches,
                end - start
            );

            loop {
                match self.store_batch_with_retry(batch, start, &label).await {
                    Ok(()) => {
                        consecutive_failures = 0;
                        break;
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        error!(error = %e, batch = %label, failures = consecutive_failures, "Batch failed");

                        if consecutive_failures >= MAX_BATCH_FAILURES {
                            self.state = ExecutorState::Aborted;
                            return Err(IndexingError::storage(
                                label,
                                consecutive_failures,
                                format!(
                                    "too many consecutive batch failures ({}/{}), aborting run: {}",
                                    consecutive_failures, MAX_BATCH_FAILURES, e
                                ),
                            ));
                        }

                        self.breaker_backoff(consecutive_failures).await;

                        match self.split_retry(batch, start, &label).await {
                            Ok(()) => {
                                info!(batch = %label, "Split retry succeeded");
                                consecutive_failures = 0;
                                break;
                            }
                            Err(split_err) => {
                                consecutive_failures += 1;
                                error!(error = %split_err, batch = %label, failures = consecutive_failures, "Split retry failed");

                                if consecutive_failures >= MAX_BATCH_FAILURES {
                                    self.state = ExecutorState::Aborted;
                                    return Err(IndexingError::storage(
                                        label,
                                        consecutive_failures,
                                        format!(
                                            "split retry failed after {} consecutive batch failures: {}",
                                            consecutive_failures, split_err
                                        ),
                                    ));
                                }

                                self.breaker_backoff(consecutive_failures).await;
                            }
                        }
                    }
                }
            }

            let progress_pct = ((batch_idx + 1) as f64 / num_batches as f64) * 100.0;
            debug!(batch = %label, progress_pct = progress_pct, "Completed batch");

            // Brief pause lets allocator churn from the finished batch settle.
            if batch_idx < num_batches - 1 {
                tokio::time::sleep(INTER_BATCH_PAUSE).await;
            }
        }

        info!(num_batches = num_batches, "Completed all batches");
        self.state = ExecutorState::Completed;
        Ok(())
    }

    /// Store one batch with up to [`STORE_MAX_RETRIES`] retries and
    /// 0.5s/1s/2s backoff.
    async fn store_batch_with_retry(
        &self,
        batch: &[Chunk],
        start_index: usize,
        label: &str,
    ) -> Result<(), IndexingError> {
        for attempt in 0..=STORE_MAX_RETRIES {
            debug!(batch = %label, attempt = attempt + 1, "Storing batch");

            match self.embed_and_store(batch, start_index).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!(batch = %label, attempt = attempt + 1, "Stored batch on retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt == STORE_MAX_RETRIES {
                        return Err(IndexingError::storage(
                            label,
                            STORE_MAX_RETRIES + 1,
                            e.to_string(),
                        ));
                    }
                    let backoff = Duration::from_secs_f64(0.5 * f64::from(1u32 << attempt));
                    warn!(batch = %label, attempt = attempt + 1, error = %e, "Attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
        unreachable!("retry loop always returns")
    }

    /// Halve the failed batch once and store each half independently
    /// through the normal per-batch retry. Single-chunk batches get one
    /// more full retry cycle instead.
    async fn split_retry(
        &self,
        batch: &[Chunk],
        start_index: usize,
        label: &str,
    ) -> Result<(), IndexingError> {
        if batch.len() > 1 {
            let mid = batch.len() / 2;
            info!(batch = %label, "Retrying with halved batches");
            self.store_batch_with_retry(&batch[..mid], start_index, &format!("{}-retry-A", label))
                .await?;
            self.store_batch_with_retry(
                &batch[mid..],
                start_index + mid,
                &format!("{}-retry-B", label),
            )
            .await
        } else {
            self.store_batch_with_retry(batch, start_index, &format!("{}-retry", label))
                .await
        }
    }

    async fn embed_and_store(
        &self,
        batch: &[Chunk],
        start_index: usize,
    ) -> Result<(), IndexingError> {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed(&texts).await?;

        if vectors.len() != batch.len() {
            return Err(IndexingError::other(format!(
                "embedding count mismatch: {} chunks, {} vectors",
                batch.len(),
                vectors.len()
            )));
        }

        let points: Vec<VectorPoint> = batch
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (chunk, vector))| {
                let virtual_record_id = chunk
                    .metadata
                    .get("virtualRecordId")
                    .and_then(Value::as_str)
                    .unwrap_or_default();

                // content and metadata nest under fixed payload keys; the
                // aircraft back-fill later writes root-level keys beside them
                let mut payload = serde_json::Map::new();
                payload.insert(
                    "page_content".to_string(),
                    Value::String(chunk.content.clone()),
                );
                payload.insert("metadata".to_string(), Value::Object(chunk.payload()));

                VectorPoint {
                    id: point_id(virtual_record_id, start_index + i, &chunk.content),
                    vector,
                    payload,
                }
            })
            .collect();

        self.vector_store
            .upsert_points(&self.collection, points)
            .await?;
        Ok(())
    }

    /// Exponential backoff with a small deterministic jitter, capped.
    async fn breaker_backoff(&self, failures: u32) {
        let secs = (f64::from(1u32 << failures) + f64::from(failures) * 0.1).min(MAX_BACKOFF_SECS);
        warn!(failures = failures, backoff_secs = secs, "Backing off before retry");
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Deterministic point id so re-indexing the same document overwrites
/// rather than duplicates.
pub fn point_id(virtual_record_id: &str, ordinal: usize, content: &str) -> String {
    let name = format!("{}/{}/{}", virtual_record_id, ordinal, content);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Advised batch size, halved (with a floor) when the sampled chunks carry
/// very long content.
fn effective_batch_size(chunks: &[Chunk], advised: usize) -> usize {
    let batch_size = advised.max(1);

    let sample = &chunks[..chunks.len().min(10)];
    if sample.is_empty() {
        return batch_size;
    }
    let avg_len = sample.iter().map(|c| c.content.len()).sum::<usize>() / sample.len();

    if avg_len > LONG_CONTENT_THRESHOLD {
        let halved = (batch_size / 2).max(MIN_BATCH_SIZE);
        info!(
            avg_content_length = avg_len,
            batch_size = halved,
            "Long chunk content detected, reducing batch size"
        );
        halved
    } else {
        batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use doc_indexer_repository::{
        CollectionInfo, CollectionSpec, EmbeddingError, PayloadFilter, VectorStoreError,
    };
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for StubEmbeddings {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.5, 0.5]).collect())
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    /// Mock vector store with scripted upsert failures.
    struct MockStore {
        /// Number of initial upsert calls that fail.
        fail_first: AtomicUsize,
        /// Fail every upsert whose batch is at least this size.
        fail_len_at_least: Option<usize>,
        /// Fail every upsert unconditionally.
        always_fail: bool,
        upsert_calls: AtomicUsize,
        stored: Mutex<Vec<Vec<String>>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                fail_first: AtomicUsize::new(0),
                fail_len_at_least: None,
                always_fail: false,
                upsert_calls: AtomicUsize::new(0),
                stored: Mutex::new(Vec::new()),
            }
        }

        fn failing_first(n: usize) -> Self {
            let store = Self::new();
            store.fail_first.store(n, Ordering::SeqCst);
            store
        }

        fn always_failing() -> Self {
            let mut store = Self::new();
            store.always_fail = true;
            store
        }

        fn failing_len_at_least(n: usize) -> Self {
            let mut store = Self::new();
            store.fail_len_at_least = Some(n);
            store
        }

        fn stored_ids(&self) -> Vec<String> {
            self.stored
                .lock()
                .unwrap()
                .iter()
                .flatten()
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl VectorStore for MockStore {
        async fn get_collection(
            &self,
            _name: &str,
        ) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(None)
        }

        async fn create_collection(
            &self,
            _name: &str,
            _spec: &CollectionSpec,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn delete_collection(&self, _name: &str) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn create_payload_index(
            &self,
            _name: &str,
            _field: &str,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn upsert_points(
            &self,
            _name: &str,
            points: Vec<VectorPoint>,
        ) -> Result<(), VectorStoreError> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);

            if self.always_fail {
                return Err(VectorStoreError::write("storage down"));
            }
            if let Some(threshold) = self.fail_len_at_least {
                if points.len() >= threshold {
                    return Err(VectorStoreError::write("batch too heavy"));
                }
            }
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(VectorStoreError::write("transient failure"));
            }

            self.stored
                .lock()
                .unwrap()
                .push(points.into_iter().map(|p| p.id).collect());
            Ok(())
        }

        async fn set_payload(
            &self,
            _name: &str,
            _filter: &PayloadFilter,
            _payload: Map<String, serde_json::Value>,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn scroll_ids(
            &self,
            _name: &str,
            _filter: &PayloadFilter,
        ) -> Result<Vec<String>, VectorStoreError> {
            Ok(Vec::new())
        }

        async fn delete_points(
            &self,
            _name: &str,
            _ids: &[String],
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }
    }

    fn chunks(count: usize) -> Vec<Chunk> {
        (0..count)
            .map(|n| Chunk {
                content: format!("chunk {}", n),
                metadata: json!({"virtualRecordId": "v-1"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                bounding_box: None,
                block_numbers: vec![n as i64],
            })
            .collect()
    }

    fn long_chunks(count: usize) -> Vec<Chunk> {
        (0..count)
            .map(|n| Chunk {
                content: format!("{}{}", "x".repeat(6000), n),
                metadata: json!({"virtualRecordId": "v-1"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                bounding_box: None,
                block_numbers: vec![n as i64],
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_stores_each_chunk_exactly_once() {
        let store = Arc::new(MockStore::new());
        let mut executor =
            BatchEmbeddingExecutor::new(store.clone(), Arc::new(StubEmbeddings), "chunks");
        let input = chunks(120);

        executor.run(&input, 50).await.unwrap();

        assert_eq!(executor.state(), ExecutorState::Completed);
        assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 3);

        let mut ids = store.stored_ids();
        assert_eq!(ids.len(), 120);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_then_completes() {
        let store = Arc::new(MockStore::failing_first(1));
        let mut executor =
            BatchEmbeddingExecutor::new(store.clone(), Arc::new(StubEmbeddings), "chunks");
        let input = chunks(60);

        executor.run(&input, 50).await.unwrap();

        assert_eq!(executor.state(), ExecutorState::Completed);
        assert_eq!(store.stored_ids().len(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_breaker_aborts_after_three_failures() {
        let store = Arc::new(MockStore::always_failing());
        let mut executor =
            BatchEmbeddingExecutor::new(store.clone(), Arc::new(StubEmbeddings), "chunks");
        let input = chunks(100);

        let err = executor.run(&input, 50).await.unwrap_err();

        assert_eq!(executor.state(), ExecutorState::Aborted);
        assert!(matches!(
            err,
            IndexingError::StorageError { attempts: 3, .. }
        ));
        assert!(store.stored_ids().is_empty());

        // all attempts targeted the first batch: whole (3 tries), split half
        // (3 tries), whole again (3 tries), then the breaker trips.
        assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_split_retry_recovers_oversized_batches() {
        // Whole batches of 50 always fail; halves succeed.
        let store = Arc::new(MockStore::failing_len_at_least(50));
        let mut executor =
            BatchEmbeddingExecutor::new(store.clone(), Arc::new(StubEmbeddings), "chunks");
        let input = chunks(100);

        executor.run(&input, 50).await.unwrap();

        assert_eq!(executor.state(), ExecutorState::Completed);

        let mut ids = store.stored_ids();
        assert_eq!(ids.len(), 100);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_content_halves_batch_size() {
        let store = Arc::new(MockStore::new());
        let mut executor =
            BatchEmbeddingExecutor::new(store.clone(), Arc::new(StubEmbeddings), "chunks");
        let input = long_chunks(50);

        executor.run(&input, 50).await.unwrap();

        // 50 chunks at an effective batch size of 25.
        assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 2);
        let sizes: Vec<usize> = store.stored.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![25, 25]);
    }

    #[test]
    fn test_point_id_deterministic() {
        let a = point_id("v-1", 3, "some content");
        let b = point_id("v-1", 3, "some content");
        let c = point_id("v-1", 4, "some content");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
