use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use waypost_db::models::UserPublicRow;
use waypost_types::api::{CreateUserRequest, StatusMessage};
use waypost_types::models::{Role, User};

use crate::auth::{AppState, hash_password};
use crate::error::ApiError;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let rows = state.db.list_users()?;
    Ok(Json(rows.into_iter().map(UserPublicRow::into_user).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    // any role other than "admin" coerces to "user"
    let role = Role::parse(req.role.as_deref().unwrap_or("user"));
    let hash = hash_password(&req.password)?;

    let row = state
        .db
        .create_user(&Uuid::new_v4().to_string(), &req.username, &hash, role.as_str())?;

    Ok((StatusCode::CREATED, Json(row.into_user())))
}

/// The bootstrap admin is immune to deletion regardless of who asks; the FK
/// cascade removes the user's assignments with the row.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusMessage>, ApiError> {
    let user = state
        .db
        .get_user_by_id(&id.to_string())?
        .ok_or(ApiError::NotFound("user"))?;

    if user.username == state.protected_admin {
        return Err(ApiError::Forbidden("the bootstrap admin cannot be deleted"));
    }

    state.db.delete_user(&id.to_string())?;
    Ok(Json(StatusMessage::new("User deleted successfully")))
}
