#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::common::{EmploymentType, Level, Location, RoleMode, RunStatus};

/// Structured output of LLM analysis of a job description.
///
/// `title` and `description` are required: an extraction without them is not
/// usable as a listing and fails parsing instead of producing an empty shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingExtraction {
    #[serde(default)]
    pub benefits: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub preferred_qualifications: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub role_mode: Option<RoleMode>,
    #[serde(default)]
    pub salary: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Transient record tracking one uploaded job description through the
/// pipeline. Unlike a candidate run it gets a fresh id of its own; the
/// permanent listing created on success gets yet another one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRun {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub file_path: String,
    pub status: RunStatus,
    #[serde(default)]
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub preferred_qualifications: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub role_mode: Option<RoleMode>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ListingRun {
    pub fn pending(id: Uuid, creator_id: Uuid, file_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            creator_id,
            file_path: file_path.into(),
            status: RunStatus::Pending,
            status_comment: None,
            created_at: now,
            updated_at: now,
            benefits: Vec::new(),
            description: None,
            employment_type: None,
            industry: None,
            job_id: None,
            level: None,
            location: Location::default(),
            organization_name: None,
            preferred_qualifications: Vec::new(),
            requirements: Vec::new(),
            role_mode: None,
            salary: None,
            title: None,
            url: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, comment: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.status_comment = Some(comment.into());
        self.touch();
    }

    /// Copies extracted listing fields onto the run and marks it completed.
    pub fn complete_with(&mut self, extraction: ListingExtraction) {
        self.benefits = extraction.benefits;
        self.description = Some(extraction.description);
        self.employment_type = extraction.employment_type;
        self.industry = extraction.industry;
        self.job_id = extraction.job_id;
        self.level = extraction.level;
        self.location = extraction.location;
        self.organization_name = extraction.organization_name;
        self.preferred_qualifications = extraction.preferred_qualifications;
        self.requirements = extraction.requirements;
        self.role_mode = extraction.role_mode;
        self.salary = extraction.salary;
        self.title = Some(extraction.title);
        self.url = extraction.url;
        self.status = RunStatus::Completed;
        self.touch();
    }
}

/// Permanent job listing, promoted from a completed run. The source run is
/// deleted after promotion, so this is the only surviving record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub embeddings: Vec<f32>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub preferred_qualifications: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub role_mode: Option<RoleMode>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Listing {
    /// Promotes a completed run to a permanent listing: fresh id, fresh
    /// timestamps, active by default, all domain fields copied over. The
    /// embedding starts empty and is filled in best-effort by the caller.
    pub fn from_run(run: &ListingRun) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            creator_id: run.creator_id,
            created_at: now,
            updated_at: now,
            benefits: run.benefits.clone(),
            description: run.description.clone(),
            embeddings: Vec::new(),
            employment_type: run.employment_type,
            industry: run.industry.clone(),
            is_active: true,
            job_id: run.job_id.clone(),
            level: run.level,
            location: run.location.clone(),
            organization_name: run.organization_name.clone(),
            preferred_qualifications: run.preferred_qualifications.clone(),
            requirements: run.requirements.clone(),
            role_mode: run.role_mode,
            salary: run.salary.clone(),
            title: run.title.clone(),
            url: run.url.clone(),
        }
    }

    /// Deterministic text used to embed the listing for similarity search.
    /// Without a description there is nothing worth embedding.
    pub fn embedding_text(&self) -> Option<String> {
        let description = self.description.as_deref()?;
        let mut text = match &self.title {
            Some(title) => format!("{title}. {description}"),
            None => description.to_string(),
        };
        if !self.requirements.is_empty() {
            text = format!("{text}. Requirements: {}", self.requirements.join(". "));
        }
        Some(text)
    }
}
