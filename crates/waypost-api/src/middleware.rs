use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use waypost_types::api::Claims;
use waypost_types::models::Role;

use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header. Any valid
/// session passes; the claims land in the request extensions.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let claims = claims_from_request(&req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like `require_auth`, but the session must carry the admin role.
pub async fn require_admin(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let claims = claims_from_request(&req)?;
    if claims.role != Role::Admin {
        return Err(ApiError::Forbidden("admin access required"));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn claims_from_request(req: &Request) -> Result<Claims, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated("authentication required"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated("authentication required"))?;

    decode_claims(token, &jwt_secret())
}

pub(crate) fn decode_claims(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthenticated("invalid or expired session"))
}

pub(crate) fn jwt_secret() -> String {
    std::env::var("WAYPOST_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into())
}
