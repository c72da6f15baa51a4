// Document persistence. Every entity is stored as a JSON document keyed by
// (kind, id); upserts are last-writer-wins, which is the only write
// coordination the pipeline relies on.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CandidateProfile, CandidateRun, Listing, ListingRun, RunStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored document is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Document kinds, one per entity family. The kind is part of the primary
/// key, so ids only need to be unique within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    CandidateRun,
    Candidate,
    ListingRun,
    Listing,
}

impl DocKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocKind::CandidateRun => "candidate_run",
            DocKind::Candidate => "candidate",
            DocKind::ListingRun => "listing_run",
            DocKind::Listing => "listing",
        }
    }
}

/// Keyed JSON persistence. The pipeline treats the store as its single source
/// of truth for run and profile state; conflicting writes to the same key are
/// serialized by the backing store, not by callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, kind: DocKind, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn upsert(&self, kind: DocKind, id: Uuid, doc: Value) -> Result<(), StoreError>;

    async fn delete(&self, kind: DocKind, id: Uuid) -> Result<(), StoreError>;

    /// All documents of `kind` whose top-level `field` equals `value`.
    async fn query_by_field(
        &self,
        kind: DocKind,
        field: &str,
        value: Value,
    ) -> Result<Vec<Value>, StoreError>;
}

/// Typed facade over the raw document store. Handlers and pipeline stages go
/// through this; only the implementations below see raw JSON.
#[derive(Clone)]
pub struct Store {
    inner: std::sync::Arc<dyn DocumentStore>,
}

impl Store {
    pub fn new(inner: std::sync::Arc<dyn DocumentStore>) -> Self {
        Self { inner }
    }

    async fn get_typed<T: DeserializeOwned>(
        &self,
        kind: DocKind,
        id: Uuid,
    ) -> Result<Option<T>, StoreError> {
        match self.inner.get(kind, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn upsert_typed<T: Serialize>(
        &self,
        kind: DocKind,
        id: Uuid,
        doc: &T,
    ) -> Result<(), StoreError> {
        self.inner.upsert(kind, id, serde_json::to_value(doc)?).await
    }

    async fn pending_of_kind<T: DeserializeOwned>(
        &self,
        kind: DocKind,
    ) -> Result<Vec<T>, StoreError> {
        let docs = self
            .inner
            .query_by_field(kind, "status", Value::String(RunStatus::Pending.as_str().into()))
            .await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    // Candidate runs

    pub async fn get_candidate_run(&self, id: Uuid) -> Result<Option<CandidateRun>, StoreError> {
        self.get_typed(DocKind::CandidateRun, id).await
    }

    pub async fn save_candidate_run(&self, run: &CandidateRun) -> Result<(), StoreError> {
        self.upsert_typed(DocKind::CandidateRun, run.id, run).await
    }

    pub async fn pending_candidate_runs(&self) -> Result<Vec<CandidateRun>, StoreError> {
        self.pending_of_kind(DocKind::CandidateRun).await
    }

    // Candidate profiles

    pub async fn get_candidate(&self, id: Uuid) -> Result<Option<CandidateProfile>, StoreError> {
        self.get_typed(DocKind::Candidate, id).await
    }

    pub async fn save_candidate(&self, profile: &CandidateProfile) -> Result<(), StoreError> {
        self.upsert_typed(DocKind::Candidate, profile.id, profile).await
    }

    // Listing runs

    pub async fn get_listing_run(&self, id: Uuid) -> Result<Option<ListingRun>, StoreError> {
        self.get_typed(DocKind::ListingRun, id).await
    }

    pub async fn save_listing_run(&self, run: &ListingRun) -> Result<(), StoreError> {
        self.upsert_typed(DocKind::ListingRun, run.id, run).await
    }

    pub async fn delete_listing_run(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete(DocKind::ListingRun, id).await
    }

    pub async fn pending_listing_runs(&self) -> Result<Vec<ListingRun>, StoreError> {
        self.pending_of_kind(DocKind::ListingRun).await
    }

    // Listings

    pub async fn save_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        self.upsert_typed(DocKind::Listing, listing.id, listing).await
    }

    pub async fn listings_by_creator(&self, creator_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let docs = self
            .inner
            .query_by_field(
                DocKind::Listing,
                "creator_id",
                Value::String(creator_id.to_string()),
            )
            .await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }
}
