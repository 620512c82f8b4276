use chrono::{Duration, Utc};
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::{OtpCode, OtpType};
use crate::config::policy;
use crate::modules::auth::crud::{normalize_email, UserCrud};
use crate::services::token;

// =============================================================================
// OTP ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Please wait before requesting another code")]
    RateLimited { time_left_seconds: i64 },

    #[error("No account found for this email")]
    UserNotFound,

    #[error("Invalid or expired code")]
    InvalidOrExpired,

    #[error("Too many failed attempts. Request a new code")]
    LockedOut,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl OtpError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidOrExpired => StatusCode::BAD_REQUEST,
            Self::LockedOut => StatusCode::LOCKED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct RateLimitStatus {
    pub can_request: bool,
    pub time_left_seconds: i64,
}

// =============================================================================
// OTP CRUD
// =============================================================================

pub struct OtpCrud {
    pool: Pool<MySql>,
}

impl OtpCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// Cooldown check against the most recent issuance for this email,
    /// across all OTP types.
    pub async fn check_rate_limit(&self, email: &str) -> Result<RateLimitStatus, sqlx::Error> {
        let email = normalize_email(email);
        let last: Option<(chrono::DateTime<Utc>,)> = sqlx::query_as(
            "SELECT created_at FROM otp_codes WHERE email = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some((created_at,)) = last else {
            return Ok(RateLimitStatus {
                can_request: true,
                time_left_seconds: 0,
            });
        };

        let elapsed = (Utc::now() - created_at).num_seconds();
        let time_left = policy::OTP_RESEND_COOLDOWN_SECS - elapsed;
        Ok(RateLimitStatus {
            can_request: time_left <= 0,
            time_left_seconds: time_left.max(0),
        })
    }

    /// Issues a fresh code for (email, type). Prior unused codes for the pair
    /// are burned so only the newest code verifies.
    pub async fn generate(&self, email: &str, otp_type: OtpType) -> Result<String, OtpError> {
        let email = normalize_email(email);

        let active_user: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM users WHERE email = ? AND is_active = TRUE",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;
        if active_user.is_none() {
            return Err(OtpError::UserNotFound);
        }

        let status = self.check_rate_limit(&email).await?;
        if !status.can_request {
            return Err(OtpError::RateLimited {
                time_left_seconds: status.time_left_seconds,
            });
        }

        sqlx::query(
            "UPDATE otp_codes SET is_used = TRUE WHERE email = ? AND otp_type = ? AND is_used = FALSE",
        )
        .bind(&email)
        .bind(otp_type.as_str())
        .execute(&self.pool)
        .await?;

        let code = token::generate_otp_code();
        sqlx::query(
            r#"
            INSERT INTO otp_codes (id, email, otp_code, otp_type, expires_at, is_used, attempts, created_at)
            VALUES (?, ?, ?, ?, ?, FALSE, 0, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&email)
        .bind(&code)
        .bind(otp_type.as_str())
        .bind(Utc::now() + Duration::minutes(policy::OTP_TTL_MINUTES))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::info!(email = %email, otp_type = otp_type.as_str(), "otp issued");

        Ok(code)
    }

    /// Verifies the newest live code for (email, type). Each mismatch counts
    /// an attempt; past the cap the code is dead regardless of input.
    /// Returns the id of the verified user.
    pub async fn verify(
        &self,
        email: &str,
        otp_code: &str,
        otp_type: OtpType,
    ) -> Result<String, OtpError> {
        let email = normalize_email(email);

        let record = sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT * FROM otp_codes
            WHERE email = ? AND otp_type = ? AND is_used = FALSE AND expires_at > ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(&email)
        .bind(otp_type.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Err(OtpError::InvalidOrExpired);
        };

        if record.attempts >= policy::OTP_MAX_ATTEMPTS {
            return Err(OtpError::LockedOut);
        }

        if record.otp_code != otp_code {
            // Counted in the database so concurrent guesses cannot undercount.
            sqlx::query("UPDATE otp_codes SET attempts = attempts + 1 WHERE id = ?")
                .bind(&record.id)
                .execute(&self.pool)
                .await?;
            return Err(OtpError::InvalidOrExpired);
        }

        // Consume exactly once; a concurrent verify of the same code loses.
        let consumed = sqlx::query("UPDATE otp_codes SET is_used = TRUE WHERE id = ? AND is_used = FALSE")
            .bind(&record.id)
            .execute(&self.pool)
            .await?;
        if consumed.rows_affected() == 0 {
            return Err(OtpError::InvalidOrExpired);
        }

        let user: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        let Some((user_id,)) = user else {
            return Err(OtpError::UserNotFound);
        };

        if otp_type == OtpType::EmailVerification {
            UserCrud::new(self.pool.clone()).set_verified(&user_id).await?;
        }

        tracing::info!(user_id = %user_id, otp_type = otp_type.as_str(), "otp verified");

        Ok(user_id)
    }
}
