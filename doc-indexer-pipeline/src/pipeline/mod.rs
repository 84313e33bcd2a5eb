//! Pipeline orchestration.
//!
//! [`IndexingPipeline`] wires the stages together and owns the order of
//! operations for one document: reconcile metadata, merge chunks, provision
//! the collection, embed and store, then reconcile the record.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::advisor;
use crate::chunker::{BoundaryMerger, VolumeOptimizer, DEFAULT_MAX_CHUNKS};
use crate::errors::IndexingError;
use crate::executor::{BatchEmbeddingExecutor, ExecutorState};
use crate::provisioner::CollectionProvisioner;
use crate::reconciler::{AircraftNormalizer, MetadataReconciler, StaticAircraftNormalizer};
use crate::recorder::CompletionRecorder;
use doc_indexer_repository::{EmbeddingProvider, RecordStore, VectorStore};
use doc_indexer_shared::{Chunk, Segment};

/// Tuning knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct IndexingPipelineConfig {
    /// Vector store collection chunks are written to.
    pub collection_name: String,
    /// Record database collection documents live in.
    pub records_collection: String,
    /// Chunk count above which the volume optimizer pre-merges.
    pub max_chunks: usize,
    /// Override the percentile breakpoint threshold with a cluster-count
    /// derived one.
    pub target_chunk_count: Option<usize>,
}

impl IndexingPipelineConfig {
    pub fn new(collection_name: impl Into<String>, records_collection: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            records_collection: records_collection.into(),
            max_chunks: DEFAULT_MAX_CHUNKS,
            target_chunk_count: None,
        }
    }
}

/// End-to-end indexing of parsed documents.
pub struct IndexingPipeline {
    vector_store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    reconciler: MetadataReconciler,
    provisioner: CollectionProvisioner,
    recorder: CompletionRecorder,
    config: IndexingPipelineConfig,
}

impl IndexingPipeline {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        record_store: Arc<dyn RecordStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: IndexingPipelineConfig,
    ) -> Self {
        Self::with_normalizer(
            vector_store,
            record_store,
            embeddings,
            config,
            Arc::new(StaticAircraftNormalizer),
        )
    }

    pub fn with_normalizer(
        vector_store: Arc<dyn VectorStore>,
        record_store: Arc<dyn RecordStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: IndexingPipelineConfig,
        normalizer: Arc<dyn AircraftNormalizer>,
    ) -> Self {
        let provisioner = CollectionProvisioner::new(vector_store.clone(), embeddings.clone());
        let recorder = CompletionRecorder::new(
            vector_store.clone(),
            record_store,
            config.collection_name.clone(),
            config.records_collection.clone(),
        );
        Self {
            vector_store,
            embeddings,
            reconciler: MetadataReconciler::new(normalizer),
            provisioner,
            recorder,
            config,
        }
    }

    /// Index one parsed document.
    ///
    /// Returns the chunks as stored, so callers can report what was
    /// indexed. All stages run to completion or the call fails; a failure
    /// after some batches were written leaves those points in place, and
    /// re-running the document overwrites them through deterministic point
    /// ids.
    #[instrument(skip(self, segments), fields(segment_count = segments.len()))]
    pub async fn index_document(
        &self,
        segments: Vec<Segment>,
        merge_documents: bool,
    ) -> Result<Vec<Chunk>, IndexingError> {
        if segments.is_empty() {
            return Err(IndexingError::document(
                None,
                "document has no segments to index",
            ));
        }

        let estimated_size_mb =
            segments.iter().map(|s| s.text.len()).sum::<usize>() as f64 / (1024.0 * 1024.0);

        // Reconcile per-segment metadata into the fixed schema, then lift
        // each segment into a chunk. The last segment's metadata carries the
        // document-level identity fields.
        let mut record_id = String::new();
        let mut virtual_record_id = String::new();
        let mut aircraft_canonical = String::new();
        let mut aircraft_aliases = Vec::new();

        let mut chunks = Vec::with_capacity(segments.len());
        for segment in segments {
            let enhanced = self.reconciler.reconcile(&segment.metadata);
            record_id = enhanced.record_id.clone();
            virtual_record_id = enhanced.virtual_record_id.clone();
            aircraft_canonical = enhanced.aircraft_canonical.clone();
            aircraft_aliases = enhanced.aircraft_aliases.clone();

            chunks.push(Chunk::from_segment(Segment {
                text: segment.text,
                metadata: enhanced.into_map(),
            })?);
        }

        if merge_documents {
            chunks = VolumeOptimizer::new(self.config.max_chunks).optimize(chunks);

            let mut merger = BoundaryMerger::new(self.embeddings.clone());
            if let Some(target) = self.config.target_chunk_count {
                merger = merger.with_target_chunk_count(target);
            }
            chunks = merger.merge(chunks).await?;
        }

        // Batch sizing follows the chunk count actually going to the store,
        // not the pre-merge segment count.
        let advice = advisor::assess(chunks.len(), estimated_size_mb);

        self.provisioner
            .ensure_collection(&self.config.collection_name)
            .await?;

        let mut executor = BatchEmbeddingExecutor::new(
            self.vector_store.clone(),
            self.embeddings.clone(),
            self.config.collection_name.clone(),
        );
        executor.run(&chunks, advice.batch_size).await?;
        debug_assert_eq!(executor.state(), ExecutorState::Completed);

        self.recorder
            .backfill_aircraft(&virtual_record_id, &aircraft_canonical, &aircraft_aliases)
            .await;

        if record_id.is_empty() {
            warn!("Segments carry no record id, skipping record status update");
        } else {
            self.recorder
                .mark_completed(&record_id, &virtual_record_id)
                .await?;
        }

        info!(
            record_id = %record_id,
            chunk_count = chunks.len(),
            "Document indexed"
        );
        Ok(chunks)
    }

    /// Delete a record's embeddings, honoring virtual record id sharing.
    pub async fn delete_embeddings(
        &self,
        record_id: &str,
        virtual_record_id: &str,
    ) -> Result<(), IndexingError> {
        self.recorder
            .delete_embeddings(record_id, virtual_record_id)
            .await
    }

    /// Whether any embeddings exist for the given virtual record id.
    pub async fn embeddings_exist(&self, virtual_record_id: &str) -> Result<bool, IndexingError> {
        self.recorder.embeddings_exist(virtual_record_id).await
    }
}
