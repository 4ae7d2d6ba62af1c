use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Claims,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User with this email already exists")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error("User not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Backend(e) => AuthError::Internal(e),
        }
    }
}

/// A user together with a freshly issued session token.
#[derive(Debug)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
    signup_credits: i32,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            state.keys.clone(),
            state.config.signup_credits,
        )
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, signup_credits: i32) -> Self {
        Self {
            users,
            keys,
            signup_credits: signup_credits.max(1),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Authenticated, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".into(),
            ));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(password)?;
        // A concurrent insert can still win; the store reports it as DuplicateEmail.
        let user = self
            .users
            .create(NewUser {
                email: &email,
                password_hash: &password_hash,
                credits: self.signup_credits,
            })
            .await?;

        let token = self.keys.sign(user.id, &user.email)?;
        info!(user_id = %user.id, email = %user.email, credits = user.credits, "user registered");
        Ok(Authenticated { user, token })
    }

    #[instrument(skip(self, password))]
    pub async fn login_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Authenticated, AuthError> {
        let email = normalize_email(email);

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        match self.users.record_login(user.id, now).await {
            Ok(()) => user.last_login_at = Some(now),
            Err(e) => warn!(error = %e, user_id = %user.id, "record_login failed"),
        }

        let token = self.keys.sign(user.id, &user.email)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(Authenticated { user, token })
    }

    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        self.keys.verify(token)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }
}
