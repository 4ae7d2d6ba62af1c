use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, PublicUser, RegisterRequest, RegisterResponse},
        extractors::AuthUser,
        services::{is_valid_email, AuthError, AuthService},
    },
    error::ApiError,
    state::AppState,
};

const MISSING_FIELDS: &str = "Email and password are required";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

/// Registration maps every failure to 400.
fn register_error(e: AuthError) -> ApiError {
    match e {
        AuthError::Internal(e) => {
            error!(error = %e, "registration failed");
            ApiError::bad_request("Registration failed")
        }
        other => ApiError::bad_request(other.to_string()),
    }
}

/// Login maps every service failure to 401.
fn login_error(e: AuthError) -> ApiError {
    match e {
        AuthError::Validation(msg) => ApiError::bad_request(msg),
        AuthError::Internal(e) => {
            error!(error = %e, "login failed");
            ApiError::unauthorized("Login failed")
        }
        other => ApiError::unauthorized(other.to_string()),
    }
}

/// Session check: a vanished user is 404, anything unexpected is a generic 401.
fn me_error(e: AuthError) -> ApiError {
    match e {
        AuthError::NotFound => ApiError::not_found(AuthError::NotFound.to_string()),
        AuthError::Internal(e) => {
            error!(error = %e, "session check failed");
            ApiError::unauthorized("Authentication failed")
        }
        other => ApiError::unauthorized(other.to_string()),
    }
}

fn credentials(
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(String, String), ApiError> {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "unreadable credentials body");
        ApiError::bad_request(MISSING_FIELDS)
    })?;
    body.into_parts()
        .ok_or_else(|| ApiError::bad_request(MISSING_FIELDS))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let (email, password) = credentials(payload)?;

    if !is_valid_email(email.trim()) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::bad_request("Invalid email address"));
    }

    let authenticated = auth
        .register_user(&email, &password)
        .await
        .map_err(register_error)?;

    info!(user_id = %authenticated.user.id, "register response sent");
    Ok(Json(RegisterResponse {
        success: true,
        user: PublicUser::from(&authenticated.user),
        token: authenticated.token,
        message: "Account created successfully".into(),
    }))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = credentials(payload)?;

    let authenticated = auth
        .login_user(&email, &password)
        .await
        .map_err(login_error)?;

    Ok(Json(LoginResponse {
        success: true,
        user: PublicUser::from(&authenticated.user),
        token: authenticated.token,
    }))
}

#[instrument(skip(auth))]
pub async fn get_me(
    State(auth): State<AuthService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = auth.current_user(user_id).await.map_err(|e| {
        warn!(user_id = %user_id, error = %e, "session user lookup failed");
        me_error(e)
    })?;

    Ok(Json(MeResponse {
        success: true,
        user: PublicUser::from(&user),
    }))
}
