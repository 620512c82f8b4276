use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: String,
    pub email: String,
    pub otp_code: String,
    pub otp_type: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    EmailVerification,
    PasswordReset,
    LoginVerification,
}

impl OtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpType::EmailVerification => "email_verification",
            OtpType::PasswordReset => "password_reset",
            OtpType::LoginVerification => "login_verification",
        }
    }
}
