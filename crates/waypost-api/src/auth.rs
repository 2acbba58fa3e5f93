use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use waypost_db::Database;
use waypost_types::api::{Claims, LoginRequest, LoginResponse};
use waypost_types::models::{Role, User};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Username of the bootstrap admin, which can never be deleted.
    pub protected_admin: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or(ApiError::Unauthenticated("invalid username or password"))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow!("stored hash unparseable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthenticated("invalid username or password"))?;

    let user = user.into_public().into_user();
    let token = create_token(&state.jwt_secret, &user, req.remember)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
    }))
}

/// Issue a session token. 1 day by default, 30 days with remember-me.
pub fn create_token(secret: &str, user: &User, remember: bool) -> anyhow::Result<String> {
    let ttl = if remember {
        chrono::Duration::days(30)
    } else {
        chrono::Duration::days(1)
    };

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Hash a password with Argon2id. The plaintext never touches the store or
/// the logs.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();

    Ok(hash)
}

/// Create the bootstrap admin if no user holds its username yet. Returns
/// true when a user was created. Never overwrites an existing account.
pub fn ensure_bootstrap_admin(
    db: &Database,
    username: &str,
    password: &str,
) -> anyhow::Result<bool> {
    if db.get_user_by_username(username)?.is_some() {
        return Ok(false);
    }

    let hash = hash_password(password)?;
    db.create_user(&Uuid::new_v4().to_string(), username, &hash, Role::Admin.as_str())?;

    info!("Bootstrap admin '{}' created", username);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_rejects() {
        let hash = hash_password("hunter2-hunter2").unwrap();
        assert_ne!(hash, "hunter2-hunter2");

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"hunter2-hunter2", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong-password", &parsed)
                .is_err()
        );
    }

    #[test]
    fn bootstrap_creates_admin_once() {
        let db = Database::open_in_memory().unwrap();

        assert!(ensure_bootstrap_admin(&db, "admin", "admin123").unwrap());
        assert!(!ensure_bootstrap_admin(&db, "admin", "admin123").unwrap());

        let admin = db.get_user_by_username("admin").unwrap().unwrap();
        assert_eq!(admin.role, "admin");
        // stored as a hash, not plaintext
        assert_ne!(admin.password, "admin123");
    }

    #[test]
    fn bootstrap_never_overwrites_existing_user() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&Uuid::new_v4().to_string(), "admin", "original-hash", "user")
            .unwrap();

        assert!(!ensure_bootstrap_admin(&db, "admin", "admin123").unwrap());

        let existing = db.get_user_by_username("admin").unwrap().unwrap();
        assert_eq!(existing.password, "original-hash");
        assert_eq!(existing.role, "user");
    }
}
