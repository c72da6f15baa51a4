pub mod candidates;
pub mod health;
pub mod listings;

use axum::{
    extract::multipart::Multipart,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::RunStatus;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate resume pipeline
        .route(
            "/api/candidates/:user_id/resume",
            post(candidates::handle_upload_resume),
        )
        .route(
            "/api/candidates/:user_id/resume/status",
            get(candidates::handle_resume_status),
        )
        // Listing pipeline
        .route("/api/listings", post(listings::handle_upload_listing))
        .route(
            "/api/listings/runs/:id/status",
            get(listings::handle_listing_status),
        )
        .with_state(state)
}

/// Body returned by both upload endpoints once the run is queued.
#[derive(Debug, Serialize)]
pub struct SubmittedBody {
    pub id: Uuid,
    pub status: RunStatus,
}

/// Body returned by both status endpoints.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: RunStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_comment: Option<String>,
}

/// Pulls the `file` field out of a multipart body: (original name, content).
pub(crate) async fn read_upload_file(
    multipart: &mut Multipart,
) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("could not read multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read file field: {e}")))?;
        return Ok((file_name, data));
    }
    Err(AppError::Validation(
        "missing multipart field 'file'".to_string(),
    ))
}

/// Storage name for an upload: fixed stem, original extension preserved so
/// the pipeline's format check sees what the client actually sent.
pub(crate) fn upload_file_name(stem: &str, original: &str) -> String {
    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

/// Clears `dir`, recreates it, and writes `file_name` into it. Returns the
/// stored file's path. Clearing first keeps exactly one document per run
/// directory, whatever was uploaded before.
pub(crate) async fn store_upload(
    dir: &Path,
    file_name: &str,
    data: &Bytes,
) -> Result<String, AppError> {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(AppError::Internal(anyhow::anyhow!(
                "could not clear upload directory {}: {e}",
                dir.display()
            )));
        }
    }
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "could not create upload directory {}: {e}",
            dir.display()
        ))
    })?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, data).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "could not write upload {}: {e}",
            path.display()
        ))
    })?;
    Ok(path.to_string_lossy().into_owned())
}
