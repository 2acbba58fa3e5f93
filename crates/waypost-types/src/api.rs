use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

// -- JWT Claims --

/// JWT claims shared by the login handler and the auth middleware.
/// Canonical definition lives here in waypost-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Extends the session from 1 day to 30 days.
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// Free-form on the wire; normalized to `admin` or `user`.
    #[serde(default)]
    pub role: Option<String>,
}

// -- Links --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLinkRequest {
    pub title: String,
    pub url: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update: absent fields leave the stored value unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateLinkRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListLinksQuery {
    #[serde(default)]
    pub grouped: bool,
}

// -- Assignments --

/// Accepts the legacy camelCase spellings alongside snake_case.
#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    #[serde(alias = "userId")]
    pub user_id: Uuid,
    #[serde(alias = "linkId")]
    pub link_id: Uuid,
}

// -- Generic status body for deletes/unassigns --

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_request_accepts_both_casings() {
        let snake: AssignmentRequest = serde_json::from_str(
            r#"{"user_id":"11111111-1111-1111-1111-111111111111","link_id":"22222222-2222-2222-2222-222222222222"}"#,
        )
        .unwrap();
        let camel: AssignmentRequest = serde_json::from_str(
            r#"{"userId":"11111111-1111-1111-1111-111111111111","linkId":"22222222-2222-2222-2222-222222222222"}"#,
        )
        .unwrap();
        assert_eq!(snake.user_id, camel.user_id);
        assert_eq!(snake.link_id, camel.link_id);
    }

    #[test]
    fn login_remember_defaults_off() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"u","password":"p"}"#).unwrap();
        assert!(!req.remember);
    }

    #[test]
    fn update_link_fields_default_to_none() {
        let req: UpdateLinkRequest = serde_json::from_str(r#"{"title":"new"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("new"));
        assert!(req.url.is_none());
        assert!(req.category.is_none());
        assert!(req.description.is_none());
    }
}
