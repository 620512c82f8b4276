use chrono::{DateTime, Duration, Utc};
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::PasswordReset;
use crate::config::policy;
use crate::modules::auth::crud::normalize_email;
use crate::services::{hashing, hashing::Argon2Config, token};

// =============================================================================
// RESET ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("Invalid or expired reset token")]
    InvalidOrExpired,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),
}

impl ResetError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidOrExpired => StatusCode::BAD_REQUEST,
            Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct ResetTokenInfo {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// RESET CRUD
// =============================================================================

pub struct ResetCrud {
    pool: Pool<MySql>,
}

impl ResetCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Issues a reset token for the account behind `email`, superseding any
    /// live token for the same user. Returns `None` when the email is
    /// unknown or inactive; the caller's response must not differ either way.
    pub async fn issue(&self, email: &str) -> Result<Option<String>, ResetError> {
        let email = normalize_email(email);

        // Token material is generated before the account lookup so the
        // unknown-email path pays the same generation and hashing cost.
        let raw_token = token::generate_token();
        let token_hash = token::hash_token(&raw_token);

        let user: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM users WHERE email = ? AND is_active = TRUE",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;
        let Some((user_id,)) = user else {
            return Ok(None);
        };

        sqlx::query("UPDATE password_resets SET used = TRUE WHERE user_id = ? AND used = FALSE")
            .bind(&user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO password_resets (id, user_id, token_hash, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user_id)
        .bind(&token_hash)
        .bind(Utc::now() + Duration::minutes(policy::RESET_TOKEN_TTL_MINUTES))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %user_id, "password reset token issued");

        Ok(Some(raw_token))
    }

    /// Read-only check for "is this link still good" pages; never consumes.
    pub async fn get_info(&self, raw_token: &str) -> Result<Option<ResetTokenInfo>, sqlx::Error> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT u.email, pr.expires_at
            FROM password_resets pr
            INNER JOIN users u ON u.id = pr.user_id
            WHERE pr.token_hash = ? AND pr.used = FALSE AND pr.expires_at > ?
            "#,
        )
        .bind(token::hash_token(raw_token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(email, expires_at)| ResetTokenInfo { email, expires_at }))
    }

    /// Burns the token and rewrites the password in one transaction: a
    /// successful reset can never leave the token reusable, and a burned
    /// token always means the password changed.
    pub async fn consume(
        &self,
        raw_token: &str,
        new_password: &str,
        argon2: &Argon2Config,
    ) -> Result<(), ResetError> {
        if new_password.len() < policy::PASSWORD_MIN_LEN {
            return Err(ResetError::WeakPassword(policy::PASSWORD_MIN_LEN));
        }

        let password_hash = hashing::hash_password(new_password, argon2)
            .map_err(|e| ResetError::Hashing(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets WHERE token_hash = ? FOR UPDATE",
        )
        .bind(token::hash_token(raw_token))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reset) = reset else {
            return Err(ResetError::InvalidOrExpired);
        };
        if reset.used || reset.expires_at <= Utc::now() {
            return Err(ResetError::InvalidOrExpired);
        }

        sqlx::query("UPDATE users SET password_hash = ?, failed_login_attempts = 0, locked_until = NULL WHERE id = ?")
            .bind(&password_hash)
            .bind(&reset.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE password_resets SET used = TRUE WHERE id = ?")
            .bind(&reset.id)
            .execute(&mut *tx)
            .await?;

        // A password change ends every open session for the account.
        sqlx::query("UPDATE sessions SET revoked = TRUE WHERE user_id = ?")
            .bind(&reset.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %reset.user_id, "password reset completed");

        Ok(())
    }
}
