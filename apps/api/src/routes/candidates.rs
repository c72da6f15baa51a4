use axum::extract::{multipart::Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::CandidateRun;
use crate::pipeline::QueueItem;
use crate::routes::{read_upload_file, store_upload, upload_file_name, StatusBody, SubmittedBody};
use crate::state::AppState;

/// POST /api/candidates/:user_id/resume
/// Accepts a multipart `file`, stores it under the candidate's upload
/// directory, writes a pending run and queues it. Responds 202 right away;
/// clients poll the status endpoint for the outcome.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmittedBody>), AppError> {
    if state.store.get_candidate(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Candidate {user_id} not found"
        )));
    }

    let (original_name, data) = read_upload_file(&mut multipart).await?;
    let stored_name = upload_file_name("cv", &original_name);
    let dir = std::path::Path::new(&state.config.uploads_dir).join(user_id.to_string());
    let file_path = store_upload(&dir, &stored_name, &data).await?;

    // One run per candidate: re-uploading overwrites the previous run.
    let run = CandidateRun::pending(user_id, &file_path);
    state.store.save_candidate_run(&run).await?;
    state.resume_queue.push(QueueItem {
        id: user_id,
        file_path,
    });
    info!("Queued resume run for candidate {user_id}");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmittedBody {
            id: run.id,
            status: run.status,
        }),
    ))
}

/// GET /api/candidates/:user_id/resume/status
pub async fn handle_resume_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StatusBody>, AppError> {
    let run = state
        .store
        .get_candidate_run(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No resume run for candidate {user_id}")))?;

    Ok(Json(StatusBody {
        status: run.status,
        updated_at: run.updated_at,
        status_comment: run.status_comment,
    }))
}
