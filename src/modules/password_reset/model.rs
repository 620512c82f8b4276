use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Reset tokens are stored hashed; the raw token exists only in the email
/// link and in the consuming request.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}
