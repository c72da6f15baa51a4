#![allow(dead_code)]

//! Résumé stage: validates the uploaded file, extracts text and links,
//! renders pages for the vision assessment, then hands off to the profiler.
//!
//! The run record stays PENDING through this whole stage; only a validation
//! failure writes a terminal status here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::extraction::{is_pdf, DocumentAnalyzer, LinkAnnotation};
use crate::llm_client::vision::VisionService;
use crate::pipeline::queue::WorkQueue;
use crate::pipeline::{ProfileTask, QueueItem};
use crate::store::{Store, StoreError};

pub struct ResumeStage {
    store: Store,
    analyzer: Arc<dyn DocumentAnalyzer>,
    vision: Arc<dyn VisionService>,
    profile_queue: WorkQueue<ProfileTask>,
    max_pages: u32,
}

impl ResumeStage {
    pub fn new(
        store: Store,
        analyzer: Arc<dyn DocumentAnalyzer>,
        vision: Arc<dyn VisionService>,
        profile_queue: WorkQueue<ProfileTask>,
        max_pages: u32,
    ) -> Self {
        Self {
            store,
            analyzer,
            vision,
            profile_queue,
            max_pages,
        }
    }

    /// Stage entry point. Validation failures are absorbed here as FAILED
    /// writes and a missing run is dropped; service failures propagate to the
    /// worker loop with the run left PENDING.
    pub async fn handle(&self, item: QueueItem) -> Result<(), PipelineError> {
        match self.process(&item).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_validation() => {
                self.fail_run(item.id, &e).await;
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!("dropping résumé work item: {e}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn process(&self, item: &QueueItem) -> Result<(), PipelineError> {
        info!("processing résumé {} from {}", item.id, item.file_path);

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

        let mut paragraphs = self.analyzer.extract_paragraphs(path).await?;
        let links = self.analyzer.link_annotations(path).await?;
        append_link_paragraphs(&mut paragraphs, &links);

        let pages_dir = scratch_dir(path);
        let images = self.analyzer.render_pages(path, &pages_dir).await?;
        debug!(
            "résumé {}: {} paragraphs, {} page images",
            item.id,
            paragraphs.len(),
            images.len()
        );

        let assessment = self
            .vision
            .describe_pages(&images)
            .await?
            .ok_or(PipelineError::VisionRefused)?;

        if let Err(e) = tokio::fs::remove_dir_all(&pages_dir).await {
            warn!(
                "could not clean up page images at {}: {e}",
                pages_dir.display()
            );
        }

        let mut run = self
            .store
            .get_candidate_run(item.id)
            .await?
            .ok_or(PipelineError::RunNotFound(item.id))?;
        run.touch();
        self.store.save_candidate_run(&run).await?;

        self.profile_queue.push(ProfileTask {
            id: item.id,
            paragraphs,
            assessment,
        });
        Ok(())
    }

    async fn fail_run(&self, id: Uuid, error: &PipelineError) {
        let mut run = match self.store.get_candidate_run(id).await {
            Ok(Some(run)) => run,
            Ok(None) => {
                warn!("résumé run {id} missing while recording failure: {error}");
                return;
            }
            Err(e) => {
                error!("could not load résumé run {id} to record failure: {e}");
                return;
            }
        };
        run.mark_failed(error.to_string());
        match self.store.save_candidate_run(&run).await {
            Ok(()) => info!("résumé run {id} failed: {error}"),
            Err(e) => error!("could not persist failure for résumé run {id}: {e}"),
        }
    }
}

/// Scratch directory for rendered pages, next to the uploaded file.
fn scratch_dir(file_path: &Path) -> PathBuf {
    file_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("pages")
}

/// Appends a synthetic paragraph for every link annotation whose target is
/// not already substring-present in the extracted text. Recovers hyperlinks
/// the text extractor flattened away.
pub(crate) fn append_link_paragraphs(paragraphs: &mut Vec<String>, links: &[LinkAnnotation]) {
    for link in links {
        if paragraphs.iter().any(|p| p.contains(&link.uri)) {
            continue;
        }
        let paragraph = match &link.anchor {
            Some(anchor) => format!("[Found link: '{anchor}' -> {}]", link.uri),
            None => format!("[Found link: {}]", link.uri),
        };
        paragraphs.push(paragraph);
    }
}

/// Re-enqueues every PENDING candidate run, returning how many were found.
/// Called once, before the pool's workers start.
pub async fn recover_pending(
    store: &Store,
    queue: &WorkQueue<QueueItem>,
) -> Result<usize, StoreError> {
    let runs = store.pending_candidate_runs().await?;
    let count = runs.len();
    for run in runs {
        debug!("re-enqueueing pending résumé run {}", run.id);
        queue.push(QueueItem {
            id: run.id,
            file_path: run.file_path,
        });
    }
    if count > 0 {
        info!("recovered {count} pending résumé runs");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateRun, RunStatus};
    use crate::pipeline::testutil::{StubAnalyzer, StubVision};
    use crate::store::memory::MemoryStore;

    fn store() -> Store {
        Store::new(Arc::new(MemoryStore::new()))
    }

    fn stage(
        store: &Store,
        analyzer: StubAnalyzer,
        vision: StubVision,
    ) -> (ResumeStage, WorkQueue<ProfileTask>) {
        let profile_queue = WorkQueue::new();
        let stage = ResumeStage::new(
            store.clone(),
            Arc::new(analyzer),
            Arc::new(vision),
            profile_queue.clone(),
            2,
        );
        (stage, profile_queue)
    }

    async fn seed_run(store: &Store, file_path: &str) -> Uuid {
        let id = Uuid::new_v4();
        store
            .save_candidate_run(&CandidateRun::pending(id, file_path))
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_run() {
        let store = store();
        let id = seed_run(&store, "/uploads/u1/cv.docx").await;
        let (stage, profile_queue) = stage(&store, StubAnalyzer::default(), StubVision::assess());

        let result = stage
            .handle(QueueItem {
                id,
                file_path: "/uploads/u1/cv.docx".to_string(),
            })
            .await;
        assert!(result.is_ok());

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(
            run.status_comment.as_deref(),
            Some("Unsupported file type: /uploads/u1/cv.docx")
        );
        assert!(profile_queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_oversized_resume_fails_with_both_counts() {
        let store = store();
        let id = seed_run(&store, "/uploads/u1/cv.pdf").await;
        let analyzer = StubAnalyzer {
            pages: 4,
            ..StubAnalyzer::default()
        };
        let (stage, profile_queue) = stage(&store, analyzer, StubVision::assess());

        stage
            .handle(QueueItem {
                id,
                file_path: "/uploads/u1/cv.pdf".to_string(),
            })
            .await
            .unwrap();

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(
            run.status_comment.as_deref(),
            Some("The file has 4 pages, which is more than the maximum allowed (2)")
        );
        assert!(profile_queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_happy_path_stays_pending_and_hands_off() {
        let store = store();
        let id = seed_run(&store, "/uploads/u1/cv.pdf").await;
        let before = store
            .get_candidate_run(id)
            .await
            .unwrap()
            .unwrap()
            .updated_at;

        let analyzer = StubAnalyzer {
            paragraphs: vec!["Ada Lovelace".to_string(), "Engineer".to_string()],
            links: vec![LinkAnnotation {
                uri: "https://example.com/ada".to_string(),
                anchor: Some("Portfolio".to_string()),
            }],
            ..StubAnalyzer::default()
        };
        let (stage, profile_queue) = stage(&store, analyzer, StubVision::assess());

        stage
            .handle(QueueItem {
                id,
                file_path: "/uploads/u1/cv.pdf".to_string(),
            })
            .await
            .unwrap();

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.status_comment.is_none());
        assert!(run.updated_at >= before);

        let task = profile_queue.try_pop().unwrap();
        assert_eq!(task.id, id);
        assert_eq!(
            task.paragraphs,
            vec![
                "Ada Lovelace".to_string(),
                "Engineer".to_string(),
                "[Found link: 'Portfolio' -> https://example.com/ada]".to_string(),
            ]
        );
        assert_eq!(task.assessment.formatting_score, 7);
    }

    #[tokio::test]
    async fn test_vision_failure_leaves_run_pending() {
        let store = store();
        let id = seed_run(&store, "/uploads/u1/cv.pdf").await;
        let (stage, profile_queue) = stage(&store, StubAnalyzer::default(), StubVision::fail());

        let result = stage
            .handle(QueueItem {
                id,
                file_path: "/uploads/u1/cv.pdf".to_string(),
            })
            .await;
        assert!(result.is_err());

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.status_comment.is_none());
        assert!(profile_queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_vision_refusal_leaves_run_pending() {
        let store = store();
        let id = seed_run(&store, "/uploads/u1/cv.pdf").await;
        let (stage, profile_queue) = stage(&store, StubAnalyzer::default(), StubVision::refuse());

        let result = stage
            .handle(QueueItem {
                id,
                file_path: "/uploads/u1/cv.pdf".to_string(),
            })
            .await;
        assert!(matches!(result, Err(PipelineError::VisionRefused)));

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Pending);
        assert!(profile_queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_missing_run_is_dropped() {
        let store = store();
        let (stage, profile_queue) = stage(&store, StubAnalyzer::default(), StubVision::assess());

        // No run record was ever written for this id.
        let result = stage
            .handle(QueueItem {
                id: Uuid::new_v4(),
                file_path: "/uploads/u1/cv.pdf".to_string(),
            })
            .await;
        assert!(result.is_ok());
        assert!(profile_queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_recover_pending_reenqueues_only_pending() {
        let store = store();
        let pending_a = seed_run(&store, "/uploads/a/cv.pdf").await;
        let pending_b = seed_run(&store, "/uploads/b/cv.pdf").await;

        let failed_id = Uuid::new_v4();
        let mut failed = CandidateRun::pending(failed_id, "/uploads/c/cv.pdf");
        failed.mark_failed("Unsupported file type: /uploads/c/cv.docx");
        store.save_candidate_run(&failed).await.unwrap();

        let queue = WorkQueue::new();
        let count = recover_pending(&store, &queue).await.unwrap();
        assert_eq!(count, 2);

        let mut recovered = vec![
            queue.try_pop().unwrap().id,
            queue.try_pop().unwrap().id,
        ];
        recovered.sort();
        let mut expected = vec![pending_a, pending_b];
        expected.sort();
        assert_eq!(recovered, expected);
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_append_link_paragraphs_formats() {
        let mut paragraphs = vec!["Contact me".to_string()];
        let links = vec![
            LinkAnnotation {
                uri: "https://example.com/blog".to_string(),
                anchor: Some("My blog".to_string()),
            },
            LinkAnnotation {
                uri: "mailto:ada@example.com".to_string(),
                anchor: None,
            },
        ];
        append_link_paragraphs(&mut paragraphs, &links);
        assert_eq!(
            paragraphs,
            vec![
                "Contact me".to_string(),
                "[Found link: 'My blog' -> https://example.com/blog]".to_string(),
                "[Found link: mailto:ada@example.com]".to_string(),
            ]
        );
    }

    #[test]
    fn test_append_link_paragraphs_skips_links_already_in_text() {
        let mut paragraphs = vec!["See https://example.com/blog for details".to_string()];
        let links = vec![LinkAnnotation {
            uri: "https://example.com/blog".to_string(),
            anchor: None,
        }];
        append_link_paragraphs(&mut paragraphs, &links);
        assert_eq!(paragraphs.len(), 1);
    }
}
