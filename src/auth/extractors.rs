use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::services::{AuthError, AuthService},
    error::ApiError,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Extracts and validates the bearer token, yielding the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))?;

        let auth = AuthService::from_ref(state);
        let claims = auth.verify_token(token).ok_or_else(|| {
            warn!("invalid or expired token");
            ApiError::unauthorized(AuthError::Unauthorized.to_string())
        })?;

        Ok(AuthUser(claims.sub))
    }
}
