#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::common::{
    Award, ContactDetails, Education, Employment, Level, Location, RunStatus,
};

/// Structured assessment of a résumé's visual design, produced by the vision
/// service from page screenshots. Carried in memory between the résumé stage
/// and the profiler; never persisted on its own (its scores land on the run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativityAssessment {
    /// Free-text description of the document's design and what it suggests
    /// about the candidate.
    pub description: String,
    /// 0-10.
    pub creativity_score: u8,
    /// 0-10.
    pub formatting_score: u8,
    /// 0-10.
    pub grammar_score: u8,
}

/// Structured output of LLM analysis of a résumé.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateExtraction {
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub contact_details: ContactDetails,
    #[serde(default)]
    pub education_history: Vec<Education>,
    #[serde(default)]
    pub employment_history: Vec<Employment>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub spoken_languages: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Any links included in the résumé, e.g. LinkedIn, blog, GitHub.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Transient record tracking one résumé through the pipeline. Keyed by the
/// candidate's own id, so at most one run exists per candidate; a re-upload
/// upserts over the previous run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRun {
    pub id: Uuid,
    pub file_path: String,
    pub status: RunStatus,
    #[serde(default)]
    pub status_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Average months per role, rounded to the nearest whole month.
    #[serde(default)]
    pub average_tenure: Option<f64>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub contact_details: ContactDetails,
    #[serde(default)]
    pub creativity_score: Option<u8>,
    #[serde(default)]
    pub education_history: Vec<Education>,
    #[serde(default)]
    pub employment_history: Vec<Employment>,
    #[serde(default)]
    pub formatting_score: Option<u8>,
    #[serde(default)]
    pub grammar_score: Option<u8>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub spoken_languages: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Total years of experience, rounded to the nearest 0.5.
    #[serde(default)]
    pub years_experience: Option<f64>,
}

impl CandidateRun {
    /// Fresh run for an uploaded résumé, with no extracted data yet.
    pub fn pending(id: Uuid, file_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            file_path: file_path.into(),
            status: RunStatus::Pending,
            status_comment: None,
            created_at: now,
            updated_at: now,
            average_tenure: None,
            awards: Vec::new(),
            contact_details: ContactDetails::default(),
            creativity_score: None,
            education_history: Vec::new(),
            employment_history: Vec::new(),
            formatting_score: None,
            grammar_score: None,
            highlights: Vec::new(),
            hobbies: Vec::new(),
            industries: Vec::new(),
            job_title: None,
            level: None,
            location: Location::default(),
            name: None,
            nationality: None,
            skills: Vec::new(),
            spoken_languages: Vec::new(),
            summary: None,
            urls: Vec::new(),
            years_experience: None,
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

    /// Copies every extracted field onto the run. Status and the numeric
    /// aggregates are the caller's responsibility.
    pub fn apply_extraction(&mut self, extraction: CandidateExtraction) {
        self.awards = extraction.awards;
        self.contact_details = extraction.contact_details;
        self.education_history = extraction.education_history;
        self.employment_history = extraction.employment_history;
        self.highlights = extraction.highlights;
        self.hobbies = extraction.hobbies;
        self.industries = extraction.industries;
        self.job_title = extraction.job_title;
        self.level = extraction.level;
        self.location = extraction.location;
        self.name = extraction.name;
        self.nationality = extraction.nationality;
        self.skills = extraction.skills;
        self.spoken_languages = extraction.spoken_languages;
        self.summary = extraction.summary;
        self.urls = extraction.urls;
    }
}

/// Permanent candidate record. Created at signup (outside this pipeline) and
/// enriched every time one of the candidate's runs completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub average_tenure: Option<f64>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub contact_details: ContactDetails,
    #[serde(default)]
    pub creativity_score: Option<u8>,
    #[serde(default)]
    pub education_history: Vec<Education>,
    #[serde(default)]
    pub embeddings: Vec<f32>,
    #[serde(default)]
    pub employment_history: Vec<Employment>,
    #[serde(default)]
    pub formatting_score: Option<u8>,
    #[serde(default)]
    pub grammar_score: Option<u8>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub is_onboarded: bool,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub location_preferences: Vec<Location>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub spoken_languages: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<f64>,
}

/// Run bookkeeping fields that must never overwrite profile state on merge.
const MERGE_EXCLUDED: &[&str] = &[
    "id",
    "status",
    "status_comment",
    "file_path",
    "created_at",
    "updated_at",
];

impl CandidateProfile {
    /// Empty profile shell for a new candidate.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            average_tenure: None,
            awards: Vec::new(),
            contact_details: ContactDetails::default(),
            creativity_score: None,
            education_history: Vec::new(),
            embeddings: Vec::new(),
            employment_history: Vec::new(),
            formatting_score: None,
            grammar_score: None,
            highlights: Vec::new(),
            hobbies: Vec::new(),
            industries: Vec::new(),
            is_onboarded: false,
            job_title: None,
            level: None,
            location: Location::default(),
            location_preferences: Vec::new(),
            name: None,
            nationality: None,
            profile_picture_url: None,
            skills: Vec::new(),
            spoken_languages: Vec::new(),
            summary: None,
            urls: Vec::new(),
            years_experience: None,
        }
    }

    /// Merges a completed run into this profile: every run field except
    /// bookkeeping overwrites the profile's value, so the latest résumé always
    /// wins; profile-only fields (embeddings, preferences, onboarding state)
    /// are untouched.
    pub fn merged_with_run(&self, run: &CandidateRun) -> serde_json::Result<CandidateProfile> {
        let mut base = serde_json::to_value(self)?;
        let overlay = serde_json::to_value(run)?;

        if let (Some(base_map), Some(overlay_map)) = (base.as_object_mut(), overlay.as_object()) {
            for (key, value) in overlay_map {
                if MERGE_EXCLUDED.contains(&key.as_str()) {
                    continue;
                }
                base_map.insert(key.clone(), value.clone());
            }
        }

        let mut merged: CandidateProfile = serde_json::from_value(base)?;
        merged.updated_at = Utc::now();
        Ok(merged)
    }

    /// Deterministic text used to embed the profile for similarity search.
    /// Returns `None` when there is nothing worth embedding.
    pub fn embedding_text(&self) -> Option<String> {
        let mut text = String::new();

        if let Some(name) = &self.name {
            text.push_str(&format!("{name}. "));
        }
        if let Some(job_title) = &self.job_title {
            text.push_str(&format!("{job_title}. "));
        }
        if let Some(summary) = &self.summary {
            text.push_str(&format!("{summary}. "));
        }
        if !self.skills.is_empty() {
            text.push_str(&format!("Skills: {}. ", self.skills.join(". ")));
        }

        let experience: Vec<String> = self
            .employment_history
            .iter()
            .filter_map(|e| match (&e.role, &e.organization_name) {
                (Some(role), Some(org)) => Some(format!("{role} at {org}")),
                _ => None,
            })
            .collect();
        if !experience.is_empty() {
            text.push_str(&format!("Experience: {}. ", experience.join(". ")));
        }

        let education: Vec<String> = self
            .education_history
            .iter()
            .filter_map(|e| match (&e.certification.name, &e.institution) {
                (Some(cert), Some(institution)) => Some(format!("{cert} from {institution}")),
                _ => None,
            })
            .collect();
        if !education.is_empty() {
            text.push_str(&format!("Education: {}.", education.join(". ")));
        }

        let text = text.trim_end().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
