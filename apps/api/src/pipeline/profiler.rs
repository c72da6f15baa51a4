#![allow(dead_code)]

//! Profiler stage: turns extracted résumé text into a structured profile,
//! computes tenure aggregates, completes the run, and merges the result into
//! the permanent candidate record.

use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::llm_client::embeddings::EmbeddingService;
use crate::llm_client::ProfileExtractor;
use crate::models::common::Employment;
use crate::models::RunStatus;
use crate::pipeline::ProfileTask;
use crate::store::{Store, StoreError};

pub struct ProfilerStage {
    store: Store,
    extractor: Arc<dyn ProfileExtractor>,
    embedder: Arc<dyn EmbeddingService>,
}

impl ProfilerStage {
    pub fn new(
        store: Store,
        extractor: Arc<dyn ProfileExtractor>,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            store,
            extractor,
            embedder,
        }
    }

    /// Stage entry point. This stage has no validation failures of its own:
    /// a missing run is dropped, anything else propagates as a service error
    /// and the run stays PENDING.
    pub async fn handle(&self, task: ProfileTask) -> Result<(), PipelineError> {
        match self.process(task).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!("dropping profiler task: {e}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn process(&self, task: ProfileTask) -> Result<(), PipelineError> {
        let extraction = self
            .extractor
            .extract_candidate(&task.paragraphs, &task.assessment)
            .await?
            .ok_or(PipelineError::ExtractionRefused)?;

        let mut run = self
            .store
            .get_candidate_run(task.id)
            .await?
            .ok_or(PipelineError::RunNotFound(task.id))?;

        run.apply_extraction(extraction);
        if !run.employment_history.is_empty() {
            let now = current_year_month();
            run.average_tenure = Some(average_tenure_months(&run.employment_history, now));
            run.years_experience = Some(years_of_experience(&run.employment_history, now));
        }
        run.creativity_score = Some(task.assessment.creativity_score);
        run.formatting_score = Some(task.assessment.formatting_score);
        run.grammar_score = Some(task.assessment.grammar_score);
        run.status = RunStatus::Completed;
        run.status_comment = None;
        run.touch();
        self.store.save_candidate_run(&run).await?;
        info!("résumé run {} completed", run.id);

        match self.store.get_candidate(task.id).await? {
            Some(profile) => {
                let mut merged = profile.merged_with_run(&run).map_err(StoreError::from)?;
                if let Some(text) = merged.embedding_text() {
                    match self.embedder.embed(&text).await {
                        Ok(embeddings) => merged.embeddings = embeddings,
                        Err(e) => warn!("embedding failed for candidate {}: {e}", task.id),
                    }
                }
                if !merged.is_onboarded {
                    merged.is_onboarded = true;
                }
                self.store.save_candidate(&merged).await?;
                info!("candidate profile {} updated from completed run", task.id);
            }
            None => {
                warn!(
                    "no candidate profile for {}; run completed without a merge",
                    task.id
                );
            }
        }
        Ok(())
    }
}

fn current_year_month() -> (i32, u32) {
    let now = Utc::now();
    (now.year(), now.month())
}

/// Whole months covered by one employment entry. Only the end date gets the
/// "present" substitution; start dates are taken as reported.
fn entry_months(entry: &Employment, now: (i32, u32)) -> f64 {
    let (end_year, end_month) = entry.end_date.resolve(now.0, now.1);
    f64::from(end_year - entry.start_date.year) * 12.0
        + (f64::from(end_month) - f64::from(entry.start_date.month))
}

/// Average months per role, rounded half-up to the nearest whole month.
pub(crate) fn average_tenure_months(history: &[Employment], now: (i32, u32)) -> f64 {
    let total: f64 = history.iter().map(|e| entry_months(e, now)).sum();
    (total / history.len() as f64).round()
}

/// Total years across all roles, rounded to the nearest 0.5.
pub(crate) fn years_of_experience(history: &[Employment], now: (i32, u32)) -> f64 {
    let total: f64 = history.iter().map(|e| entry_months(e, now) / 12.0).sum();
    (total * 2.0).round() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::FlexibleDate;
    use crate::models::{CandidateProfile, CandidateRun};
    use crate::pipeline::testutil::{assessment, StubEmbedder, StubExtractor, StubOutcome};
    use crate::store::memory::MemoryStore;
    use uuid::Uuid;

    fn employment(start: (i32, u32), end: (i32, u32)) -> Employment {
        Employment {
            start_date: FlexibleDate::new(start.0, start.1),
            end_date: FlexibleDate::new(end.0, end.1),
            ..Employment::default()
        }
    }

    #[test]
    fn test_single_entry_tenure_is_exact_months() {
        let history = vec![employment((2020, 1), (2022, 1))];
        assert_eq!(average_tenure_months(&history, (2024, 7)), 24.0);
    }

    #[test]
    fn test_present_entry_uses_now_for_end() {
        let history = vec![employment((2020, 1), (0, 0))];
        // 2020-01 to 2024-07 is 54 months, 4.5 years.
        assert_eq!(average_tenure_months(&history, (2024, 7)), 54.0);
        assert_eq!(years_of_experience(&history, (2024, 7)), 4.5);
    }

    #[test]
    fn test_average_tenure_rounds_half_up() {
        // 24 and 25 months average to 24.5, which rounds up to 25.
        let history = vec![
            employment((2020, 1), (2022, 1)),
            employment((2020, 1), (2022, 2)),
        ];
        assert_eq!(average_tenure_months(&history, (2024, 7)), 25.0);
    }

    #[test]
    fn test_years_rounding_at_quarter_boundaries() {
        // 4 years 3 months = 4.25 -> 4.5
        let history = vec![employment((2020, 1), (2024, 4))];
        assert_eq!(years_of_experience(&history, (2024, 7)), 4.5);

        // 4 years 9 months = 4.75 -> 5.0
        let history = vec![employment((2020, 1), (2024, 10))];
        assert_eq!(years_of_experience(&history, (2024, 7)), 5.0);

        // 4 years 1 month = 4.083 -> 4.0
        let history = vec![employment((2020, 1), (2024, 2))];
        assert_eq!(years_of_experience(&history, (2024, 7)), 4.0);
    }

    #[test]
    fn test_years_sums_across_entries() {
        let history = vec![
            employment((2018, 1), (2020, 1)),
            employment((2020, 1), (2022, 7)),
        ];
        // 2.0 + 2.5 years.
        assert_eq!(years_of_experience(&history, (2024, 7)), 4.5);
    }

    fn store() -> Store {
        Store::new(Arc::new(MemoryStore::new()))
    }

    fn stage(store: &Store, extractor: StubExtractor, embedder: StubEmbedder) -> ProfilerStage {
        ProfilerStage::new(store.clone(), Arc::new(extractor), Arc::new(embedder))
    }

    async fn seed_run(store: &Store) -> Uuid {
        let id = Uuid::new_v4();
        store
            .save_candidate_run(&CandidateRun::pending(id, "/uploads/u1/cv.pdf"))
            .await
            .unwrap();
        id
    }

    fn task(id: Uuid) -> ProfileTask {
        ProfileTask {
            id,
            paragraphs: vec!["Ada Lovelace".to_string(), "Engineer".to_string()],
            assessment: assessment(),
        }
    }

    #[tokio::test]
    async fn test_run_completed_with_aggregates_and_scores() {
        let store = store();
        let id = seed_run(&store).await;
        let stage = stage(&store, StubExtractor::default(), StubEmbedder::default());

        stage.handle(task(id)).await.unwrap();

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.name.as_deref(), Some("Ada Lovelace"));
        // Default stub employment spans 2020-01 to 2022-01.
        assert_eq!(run.average_tenure, Some(24.0));
        assert_eq!(run.years_experience, Some(2.0));
        assert_eq!(run.creativity_score, Some(5));
        assert_eq!(run.formatting_score, Some(7));
        assert_eq!(run.grammar_score, Some(8));
    }

    #[tokio::test]
    async fn test_no_employment_history_leaves_aggregates_unset() {
        let store = store();
        let id = seed_run(&store).await;
        let extractor = StubExtractor {
            candidate: crate::models::CandidateExtraction {
                name: Some("Ada Lovelace".to_string()),
                ..Default::default()
            },
            ..StubExtractor::default()
        };
        let stage = stage(&store, extractor, StubEmbedder::default());

        stage.handle(task(id)).await.unwrap();

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.average_tenure, None);
        assert_eq!(run.years_experience, None);
    }

    #[tokio::test]
    async fn test_merge_updates_profile_and_flips_onboarded() {
        let store = store();
        let id = seed_run(&store).await;
        store
            .save_candidate(&CandidateProfile::new(id))
            .await
            .unwrap();
        let stage = stage(&store, StubExtractor::default(), StubEmbedder::default());

        stage.handle(task(id)).await.unwrap();

        let profile = store.get_candidate(id).await.unwrap().unwrap();
        assert!(profile.is_onboarded);
        assert_eq!(profile.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.average_tenure, Some(24.0));
        assert_eq!(profile.embeddings, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_onboarded_stays_true_on_rerun() {
        let store = store();
        let id = seed_run(&store).await;
        let mut profile = CandidateProfile::new(id);
        profile.is_onboarded = true;
        store.save_candidate(&profile).await.unwrap();
        let stage = stage(&store, StubExtractor::default(), StubEmbedder::default());

        stage.handle(task(id)).await.unwrap();

        let profile = store.get_candidate(id).await.unwrap().unwrap();
        assert!(profile.is_onboarded);
    }

    #[tokio::test]
    async fn test_embedding_failure_does_not_block_merge() {
        let store = store();
        let id = seed_run(&store).await;
        store
            .save_candidate(&CandidateProfile::new(id))
            .await
            .unwrap();
        let stage = stage(&store, StubExtractor::default(), StubEmbedder { fail: true });

        stage.handle(task(id)).await.unwrap();

        let profile = store.get_candidate(id).await.unwrap().unwrap();
        assert!(profile.is_onboarded);
        assert!(profile.embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_refusal_leaves_run_pending() {
        let store = store();
        let id = seed_run(&store).await;
        let stage = stage(
            &store,
            StubExtractor::with_outcome(StubOutcome::Refuse),
            StubEmbedder::default(),
        );

        let result = stage.handle(task(id)).await;
        assert!(matches!(result, Err(PipelineError::ExtractionRefused)));

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_run_is_dropped() {
        let store = store();
        let stage = stage(&store, StubExtractor::default(), StubEmbedder::default());
        let result = stage.handle(task(Uuid::new_v4())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_profile_still_completes_run() {
        let store = store();
        let id = seed_run(&store).await;
        let stage = stage(&store, StubExtractor::default(), StubEmbedder::default());

        stage.handle(task(id)).await.unwrap();

        let run = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(store.get_candidate(id).await.unwrap().is_none());
    }
}
