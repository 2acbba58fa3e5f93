use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use waypost_db::models::LinkRow;
use waypost_types::api::{Claims, CreateLinkRequest, ListLinksQuery, StatusMessage, UpdateLinkRequest};
use waypost_types::models::{GroupedLinks, Link, Role};

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /api/links: the whole catalog, flat or grouped by category.
pub async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Response, ApiError> {
    let links = fetch_catalog(&state)?;

    if query.grouped {
        Ok(Json(group_links_by_category(links)).into_response())
    } else {
        Ok(Json(links).into_response())
    }
}

pub async fn create_link(
    State(state): State<AppState>,
    Json(req): Json<CreateLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_field("title", &req.title)?;
    require_field("url", &req.url)?;
    require_field("category", &req.category)?;

    let row = state.db.create_link(
        &Uuid::new_v4().to_string(),
        &req.title,
        &req.url,
        &req.category,
        &req.description,
    )?;

    Ok((StatusCode::CREATED, Json(row.into_link())))
}

pub async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLinkRequest>,
) -> Result<Json<Link>, ApiError> {
    let row = state.db.update_link(
        &id.to_string(),
        req.title,
        req.url,
        req.category,
        req.description,
    )?;

    Ok(Json(row.into_link()))
}

pub async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.db.delete_link(&id.to_string())?;
    Ok(Json(StatusMessage::new("Link deleted successfully")))
}

/// GET /api/links/user-assigned: the caller's dashboard view. Admins see
/// the full grouped catalog; everyone else sees only their assigned links.
pub async fn user_assigned_links(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<GroupedLinks>, ApiError> {
    let links = if claims.role == Role::Admin {
        fetch_catalog(&state)?
    } else {
        state
            .db
            .get_user_assigned_links(&claims.sub.to_string())?
            .into_iter()
            .map(LinkRow::into_link)
            .collect()
    };

    Ok(Json(group_links_by_category(links)))
}

fn fetch_catalog(state: &AppState) -> Result<Vec<Link>, ApiError> {
    let rows = state.db.list_links()?;
    Ok(rows.into_iter().map(LinkRow::into_link).collect())
}

/// Single-pass partition by category label. Keys appear in first-encounter
/// order and each bucket preserves the input order; no bucket is ever empty.
/// Callers wanting alphabetical categories sort the keys themselves.
pub fn group_links_by_category(links: Vec<Link>) -> GroupedLinks {
    let mut grouped = GroupedLinks::new();
    for link in links {
        grouped
            .entry(link.category.clone())
            .or_insert_with(Vec::new)
            .push(link);
    }
    grouped
}

fn require_field(name: &'static str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", name)));
    }
    Ok(())
}
