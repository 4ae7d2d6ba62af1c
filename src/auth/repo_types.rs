use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// Deliberately not `Serialize`: responses go through `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                            // unique user ID
    pub email: String,                       // normalised email
    pub password_hash: String,               // Argon2 PHC string
    pub credits: i32,                        // remaining credits
    pub created_at: OffsetDateTime,          // creation timestamp
    pub last_login_at: Option<OffsetDateTime>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub credits: i32,
}
