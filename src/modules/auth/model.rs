use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Roles a caller may pick for themselves at signup. `admin` is provisioned
/// out-of-band, never self-assigned.
pub const SIGNUP_ROLES: &[&str] = &["user", "facility_owner"];

pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One session row holds the session/refresh pair so the two tokens are
/// issued and revoked together. Only SHA-256 hashes of the tokens are stored.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}
