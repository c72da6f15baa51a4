// Asynchronous document pipelines: fixed worker pools draining FIFO queues,
// with crash recovery via a startup re-scan of PENDING runs.

pub mod listing;
pub mod pool;
pub mod profiler;
pub mod queue;
pub mod resume;

#[cfg(test)]
pub(crate) mod testutil;

pub use pool::{WorkItem, WorkerPool};
pub use queue::WorkQueue;

use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::extraction::DocumentAnalyzer;
use crate::llm_client::embeddings::EmbeddingService;
use crate::llm_client::vision::VisionService;
use crate::llm_client::ProfileExtractor;
use crate::models::CreativityAssessment;
use crate::store::{Store, StoreError};

use listing::ListingStage;
use profiler::ProfilerStage;
use resume::ResumeStage;

/// (item id, file path) pair consumed by the résumé and listing stages.
/// Ephemeral: lives only in memory inside a queue.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: Uuid,
    pub file_path: String,
}

impl WorkItem for QueueItem {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Hand-off payload from the résumé stage to the profiler stage.
#[derive(Debug, Clone)]
pub struct ProfileTask {
    pub id: Uuid,
    pub paragraphs: Vec<String>,
    pub assessment: CreativityAssessment,
}

impl WorkItem for ProfileTask {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Every running pool plus the queues producers submit into. Constructed
/// eagerly, exactly once, at process start; upload handlers only ever see
/// the queues.
pub struct Pipelines {
    pub resume_queue: WorkQueue<QueueItem>,
    pub listing_queue: WorkQueue<QueueItem>,
    resume_pool: WorkerPool,
    listing_pool: WorkerPool,
    profiler_pool: WorkerPool,
}

impl Pipelines {
    /// Builds the three stages, re-enqueues runs left PENDING by a previous
    /// process, and starts the worker pools. Recovery happens before any
    /// worker runs, so each recovered run is submitted exactly once.
    pub async fn start(
        config: &Config,
        store: Store,
        analyzer: Arc<dyn DocumentAnalyzer>,
        vision: Arc<dyn VisionService>,
        extractor: Arc<dyn ProfileExtractor>,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Self, StoreError> {
        let resume_queue = WorkQueue::new();
        let listing_queue = WorkQueue::new();
        let profile_queue = WorkQueue::new();

        resume::recover_pending(&store, &resume_queue).await?;
        listing::recover_pending(&store, &listing_queue).await?;

        let profiler = Arc::new(ProfilerStage::new(
            store.clone(),
            Arc::clone(&extractor),
            Arc::clone(&embedder),
        ));
        let profiler_pool = WorkerPool::start(
            "profiler",
            config.stage_workers,
            profile_queue.clone(),
            move |task: ProfileTask| {
                let profiler = Arc::clone(&profiler);
                async move { profiler.handle(task).await }
            },
        );

        let resume_stage = Arc::new(ResumeStage::new(
            store.clone(),
            Arc::clone(&analyzer),
            vision,
            profile_queue,
            config.cv_max_pages,
        ));
        let resume_pool = WorkerPool::start(
            "resume",
            config.stage_workers,
            resume_queue.clone(),
            move |item: QueueItem| {
                let stage = Arc::clone(&resume_stage);
                async move { stage.handle(item).await }
            },
        );

        let listing_stage = Arc::new(ListingStage::new(
            store,
            analyzer,
            extractor,
            embedder,
            config.jd_max_pages,
        ));
        let listing_pool = WorkerPool::start(
            "listing",
            config.stage_workers,
            listing_queue.clone(),
            move |item: QueueItem| {
                let stage = Arc::clone(&listing_stage);
                async move { stage.handle(item).await }
            },
        );

        Ok(Self {
            resume_queue,
            listing_queue,
            resume_pool,
            listing_pool,
            profiler_pool,
        })
    }

    /// Stops the intake pools first so no new profiler tasks appear, then the
    /// profiler pool. Tasks still queued at that point are dropped; their runs
    /// stay PENDING and are recovered on the next start.
    pub async fn shutdown(self) {
        self.resume_pool.shutdown().await;
        self.listing_pool.shutdown().await;
        self.profiler_pool.shutdown().await;
    }
}
