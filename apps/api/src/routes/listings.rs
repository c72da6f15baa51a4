use axum::extract::{multipart::Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ListingRun;
use crate::pipeline::QueueItem;
use crate::routes::{store_upload, upload_file_name, StatusBody, SubmittedBody};
use crate::state::AppState;

/// POST /api/listings
/// Multipart body with a `creator_id` text field and a `file` field. Creates
/// a pending run under a fresh id and queues it. On success the run is
/// promoted to a listing and deleted, after which the status endpoint
/// returns 404.
pub async fn handle_upload_listing(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmittedBody>), AppError> {
    let mut creator_id: Option<Uuid> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("could not read multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "creator_id" => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("could not read creator_id field: {e}"))
                })?;
                let id = text.parse::<Uuid>().map_err(|_| {
                    AppError::Validation(format!("creator_id is not a valid UUID: '{text}'"))
                })?;
                creator_id = Some(id);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("could not read file field: {e}"))
                })?;
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let creator_id = creator_id.ok_or_else(|| {
        AppError::Validation("missing multipart field 'creator_id'".to_string())
    })?;
    let (original_name, data) =
        file.ok_or_else(|| AppError::Validation("missing multipart field 'file'".to_string()))?;

    let run_id = Uuid::new_v4();
    let stored_name = upload_file_name("jd", &original_name);
    let dir = std::path::Path::new(&state.config.uploads_dir)
        .join("listings")
        .join(run_id.to_string());
    let file_path = store_upload(&dir, &stored_name, &data).await?;

    let run = ListingRun::pending(run_id, creator_id, &file_path);
    state.store.save_listing_run(&run).await?;
    state.listing_queue.push(QueueItem {
        id: run_id,
        file_path,
    });
    info!("Queued listing run {run_id} for creator {creator_id}");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmittedBody {
            id: run.id,
            status: run.status,
        }),
    ))
}

/// GET /api/listings/runs/:id/status
pub async fn handle_listing_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusBody>, AppError> {
    let run = state
        .store
        .get_listing_run(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Processing run {id} not found")))?;

    Ok(Json(StatusBody {
        status: run.status,
        updated_at: run.updated_at,
        status_comment: run.status_comment,
    }))
}
