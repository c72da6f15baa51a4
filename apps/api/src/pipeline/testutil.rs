//! Scripted stand-ins for the external collaborators, shared by the stage
//! tests. Outcomes are fixed at construction; call counters let tests assert
//! exactly-once processing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::extraction::{DocumentAnalyzer, ExtractError, LinkAnnotation};
use crate::llm_client::embeddings::EmbeddingService;
use crate::llm_client::vision::VisionService;
use crate::llm_client::{LlmError, ProfileExtractor};
use crate::models::common::{Employment, FlexibleDate, Location};
use crate::models::{CandidateExtraction, CreativityAssessment, ListingExtraction};

#[derive(Debug, Clone, Copy)]
pub(crate) enum StubOutcome {
    Succeed,
    Refuse,
    Fail,
}

pub(crate) struct StubAnalyzer {
    pub pages: usize,
    pub paragraphs: Vec<String>,
    pub links: Vec<LinkAnnotation>,
}

impl Default for StubAnalyzer {
    fn default() -> Self {
        Self {
            pages: 1,
            paragraphs: vec!["Experienced engineer".to_string()],
            links: Vec::new(),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for StubAnalyzer {
    async fn page_count(&self, _path: &Path) -> Result<usize, ExtractError> {
        Ok(self.pages)
    }

    async fn extract_paragraphs(&self, _path: &Path) -> Result<Vec<String>, ExtractError> {
        Ok(self.paragraphs.clone())
    }

    async fn link_annotations(&self, _path: &Path) -> Result<Vec<LinkAnnotation>, ExtractError> {
        Ok(self.links.clone())
    }

    async fn render_pages(
        &self,
        _path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractError> {
        Ok(vec![out_dir.join("page-1.png")])
    }
}

pub(crate) fn assessment() -> CreativityAssessment {
    CreativityAssessment {
        description: "Tidy single-column layout".to_string(),
        creativity_score: 5,
        formatting_score: 7,
        grammar_score: 8,
    }
}

pub(crate) struct StubVision {
    outcome: StubOutcome,
}

impl StubVision {
    pub fn assess() -> Self {
        Self {
            outcome: StubOutcome::Succeed,
        }
    }

    pub fn refuse() -> Self {
        Self {
            outcome: StubOutcome::Refuse,
        }
    }

    pub fn fail() -> Self {
        Self {
            outcome: StubOutcome::Fail,
        }
    }
}

#[async_trait]
impl VisionService for StubVision {
    async fn describe_pages(
        &self,
        _images: &[PathBuf],
    ) -> Result<Option<CreativityAssessment>, LlmError> {
        match self.outcome {
            StubOutcome::Succeed => Ok(Some(assessment())),
            StubOutcome::Refuse => Ok(None),
            StubOutcome::Fail => Err(LlmError::EmptyContent),
        }
    }
}

pub(crate) fn candidate_extraction() -> CandidateExtraction {
    CandidateExtraction {
        name: Some("Ada Lovelace".to_string()),
        job_title: Some("Systems Engineer".to_string()),
        summary: Some("Builds engines".to_string()),
        skills: vec!["Rust".to_string()],
        employment_history: vec![Employment {
            organization_name: Some("Analytical Engines Ltd".to_string()),
            role: Some("Engineer".to_string()),
            start_date: FlexibleDate::new(2020, 1),
            end_date: FlexibleDate::new(2022, 1),
            ..Employment::default()
        }],
        ..CandidateExtraction::default()
    }
}

pub(crate) fn listing_extraction() -> ListingExtraction {
    ListingExtraction {
        benefits: Vec::new(),
        description: "Build the ingestion pipeline".to_string(),
        employment_type: None,
        industry: None,
        job_id: None,
        level: None,
        location: Location::default(),
        organization_name: None,
        preferred_qualifications: Vec::new(),
        requirements: vec!["Rust".to_string(), "Postgres".to_string()],
        role_mode: None,
        salary: None,
        title: "Senior Engineer".to_string(),
        url: None,
    }
}

pub(crate) struct StubExtractor {
    pub outcome: StubOutcome,
    pub candidate: CandidateExtraction,
    pub listing: ListingExtraction,
    pub candidate_calls: Arc<AtomicUsize>,
    pub listing_calls: Arc<AtomicUsize>,
}

impl Default for StubExtractor {
    fn default() -> Self {
        Self {
            outcome: StubOutcome::Succeed,
            candidate: candidate_extraction(),
            listing: listing_extraction(),
            candidate_calls: Arc::new(AtomicUsize::new(0)),
            listing_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl StubExtractor {
    pub fn with_outcome(outcome: StubOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ProfileExtractor for StubExtractor {
    async fn extract_candidate(
        &self,
        _paragraphs: &[String],
        _assessment: &CreativityAssessment,
    ) -> Result<Option<CandidateExtraction>, LlmError> {
        self.candidate_calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            StubOutcome::Succeed => Ok(Some(self.candidate.clone())),
            StubOutcome::Refuse => Ok(None),
            StubOutcome::Fail => Err(LlmError::EmptyContent),
        }
    }

    async fn extract_listing(
        &self,
        _paragraphs: &[String],
    ) -> Result<Option<ListingExtraction>, LlmError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            StubOutcome::Succeed => Ok(Some(self.listing.clone())),
            StubOutcome::Refuse => Ok(None),
            StubOutcome::Fail => Err(LlmError::EmptyContent),
        }
    }
}

#[derive(Default)]
pub(crate) struct StubEmbedder {
    pub fail: bool,
}

#[async_trait]
impl EmbeddingService for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        if self.fail {
            Err(LlmError::EmptyContent)
        } else {
            Ok(vec![0.1, 0.2, 0.3])
        }
    }
}
