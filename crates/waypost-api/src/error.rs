use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use waypost_db::DbError;

/// Request-level errors. Each variant maps to a status code; the message is
/// what the presentation layer shows verbatim, so domain variants carry
/// user-readable text while `Internal` stays generic.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("link already assigned to user")]
    AlreadyAssigned,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::DuplicateUsername | ApiError::AlreadyAssigned => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuplicateUsername => ApiError::DuplicateUsername,
            DbError::AlreadyAssigned => ApiError::AlreadyAssigned,
            DbError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            // log the cause, keep the body generic
            error!("internal error: {:#}", cause);
        }

        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_map_to_inspectable_kinds() {
        assert!(matches!(
            ApiError::from(DbError::DuplicateUsername),
            ApiError::DuplicateUsername
        ));
        assert!(matches!(
            ApiError::from(DbError::AlreadyAssigned),
            ApiError::AlreadyAssigned
        ));
        assert!(matches!(
            ApiError::from(DbError::NotFound("user")),
            ApiError::NotFound("user")
        ));
        assert!(matches!(
            ApiError::from(DbError::LockPoisoned),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn status_codes_follow_the_error_table() {
        assert_eq!(
            ApiError::Unauthenticated("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("link").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::DuplicateUsername.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::AlreadyAssigned.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_body_is_generic() {
        let err = ApiError::Internal(anyhow::anyhow!("secret table layout detail"));
        assert_eq!(err.to_string(), "internal server error");
    }
}
