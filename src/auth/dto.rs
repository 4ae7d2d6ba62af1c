use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for registration and login. Fields are optional so a
/// missing field is reported as a 400 rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Both fields, or `None` if either is absent or blank.
    pub fn into_parts(self) -> Option<(String, String)> {
        let email = self.email.filter(|e| !e.trim().is_empty())?;
        let password = self.password.filter(|p| !p.is_empty())?;
        Some((email, password))
    }
}

pub type RegisterRequest = CredentialsRequest;
pub type LoginRequest = CredentialsRequest;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: PublicUser,
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
///
/// The only way user data reaches a response; the password hash has no field here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub credits: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            credits: user.credits,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}
