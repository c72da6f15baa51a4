#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::extraction::ExtractError;
use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Store(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Error type for the background processing stages.
///
/// Workers route on the class of the error, not the variant:
/// - validation errors are written to the run as a FAILED status with the
///   message as the status comment, so the uploader sees why;
/// - a missing run is logged and the work item dropped;
/// - everything else is a service error: logged only, and the run stays
///   PENDING so the recovery scan re-enqueues it on the next startup.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file type: {path}")]
    UnsupportedFormat { path: String },

    #[error("The file has {pages} pages, which is more than the maximum allowed ({max})")]
    TooManyPages { pages: usize, max: u32 },

    #[error("Processing run {0} not found")]
    RunNotFound(Uuid),

    #[error("vision model declined to assess the document")]
    VisionRefused,

    #[error("extraction model declined to produce a profile")]
    ExtractionRefused,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// True for errors caused by the uploaded document itself. These are
    /// terminal: retrying the same file can never succeed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedFormat { .. } | PipelineError::TooManyPages { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::RunNotFound(_))
    }
}
