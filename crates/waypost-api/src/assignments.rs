use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::error;
use uuid::Uuid;

use waypost_types::api::{AssignmentRequest, StatusMessage};
use waypost_types::models::{Assignment, AssignmentDetail};

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /api/assignments: every ledger row joined with both sides, newest
/// first.
pub async fn list_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentDetail>>, ApiError> {
    // Run the three-way join off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.get_all_assignments())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??;

    let assignments = rows
        .into_iter()
        .map(|row| AssignmentDetail {
            assignment: row.assignment.into_assignment(),
            user: row.user.into_user(),
            link: row.link.into_link(),
        })
        .collect();

    Ok(Json(assignments))
}

pub async fn create_assignment(
    State(state): State<AppState>,
    Json(req): Json<AssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    let row = state.db.create_assignment(
        &Uuid::new_v4().to_string(),
        &req.user_id.to_string(),
        &req.link_id.to_string(),
    )?;

    Ok((StatusCode::CREATED, Json(row.into_assignment())))
}

/// DELETE /api/assignments/{user_id}/{link_id}, idempotent.
pub async fn remove_assignment(
    State(state): State<AppState>,
    Path((user_id, link_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<StatusMessage>, ApiError> {
    state
        .db
        .delete_assignment(&user_id.to_string(), &link_id.to_string())?;
    Ok(Json(StatusMessage::new("Assignment removed successfully")))
}

/// DELETE /api/assignments with the pair in the body: same operation, kept
/// for clients that cannot set path parameters on DELETE.
pub async fn remove_assignment_body(
    State(state): State<AppState>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    state
        .db
        .delete_assignment(&req.user_id.to_string(), &req.link_id.to_string())?;
    Ok(Json(StatusMessage::new("Link unassigned successfully")))
}
