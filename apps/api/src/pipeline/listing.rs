#![allow(dead_code)]

//! Listing stage: single-stage pipeline for job descriptions. Validates,
//! extracts, then promotes the completed run to a permanent Listing and
//! deletes the run record.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::extraction::{is_pdf, DocumentAnalyzer};
use crate::llm_client::embeddings::EmbeddingService;
use crate::llm_client::ProfileExtractor;
use crate::models::Listing;
use crate::pipeline::queue::WorkQueue;
use crate::pipeline::QueueItem;
use crate::store::{Store, StoreError};

pub struct ListingStage {
    store: Store,
    analyzer: Arc<dyn DocumentAnalyzer>,
    extractor: Arc<dyn ProfileExtractor>,
    embedder: Arc<dyn EmbeddingService>,
    max_pages: u32,
}

impl ListingStage {
    pub fn new(
        store: Store,
        analyzer: Arc<dyn DocumentAnalyzer>,
        extractor: Arc<dyn ProfileExtractor>,
        embedder: Arc<dyn EmbeddingService>,
        max_pages: u32,
    ) -> Self {
        Self {
            store,
            analyzer,
            extractor,
            embedder,
            max_pages,
        }
    }

    /// Stage entry point; same error routing as the résumé stage.
    pub async fn handle(&self, item: QueueItem) -> Result<(), PipelineError> {
        match self.process(&item).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_validation() => {
                self.fail_run(item.id, &e).await;
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!("dropping listing work item: {e}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn process(&self, item: &QueueItem) -> Result<(), PipelineError> {
        info!("processing listing {} from {}", item.id, item.file_path);

        let mut run = self
            .store
            .get_listing_run(item.id)
            .await?
            .ok_or(PipelineError::RunNotFound(item.id))?;

        if !is_pdf(&item.file_path) {
            return Err(PipelineError::UnsupportedFormat {
                path: item.file_path.clone(),
            });
        }

        let path = Path::new(&item.file_path);
        let pages = self.analyzer.page_count(path).await?;
        if pages > self.max_pages as usize {
            return Err(PipelineError::TooManyPages {
                pages,
                max: self.max_pages,
            });
        }

        let paragraphs = self.analyzer.extract_paragraphs(path).await?;
        let extraction = self
            .extractor
            .extract_listing(&paragraphs)
            .await?
            .ok_or(PipelineError::ExtractionRefused)?;

        run.complete_with(extraction);
        self.store.save_listing_run(&run).await?;
        debug!("listing run {} completed, promoting", run.id);

        let mut listing = Listing::from_run(&run);
        if let Some(text) = listing.embedding_text() {
            match self.embedder.embed(&text).await {
                Ok(embeddings) => listing.embeddings = embeddings,
                Err(e) => warn!("embedding failed for listing {}: {e}", listing.id),
            }
        }

        self.store.save_listing(&listing).await?;
        self.store.delete_listing_run(run.id).await?;
        info!("listing {} created from run {}", listing.id, run.id);
        Ok(())
    }

    async fn fail_run(&self, id: Uuid, error: &PipelineError) {
        let mut run = match self.store.get_listing_run(id).await {
            Ok(Some(run)) => run,
            Ok(None) => {
                warn!("listing run {id} missing while recording failure: {error}");
                return;
            }
            Err(e) => {
                error!("could not load listing run {id} to record failure: {e}");
                return;
            }
        };
        run.mark_failed(error.to_string());
        match self.store.save_listing_run(&run).await {
            Ok(()) => info!("listing run {id} failed: {error}"),
            Err(e) => error!("could not persist failure for listing run {id}: {e}"),
        }
    }
}

/// Re-enqueues every PENDING listing run, returning how many were found.
/// Called once, before the pool's workers start.
pub async fn recover_pending(
    store: &Store,
    queue: &WorkQueue<QueueItem>,
) -> Result<usize, StoreError> {
    let runs = store.pending_listing_runs().await?;
    let count = runs.len();
    for run in runs {
        debug!("re-enqueueing pending listing run {}", run.id);
        queue.push(QueueItem {
            id: run.id,
            file_path: run.file_path,
        });
    }
    if count > 0 {
        info!("recovered {count} pending listing runs");
    }
    Ok(count)
}
