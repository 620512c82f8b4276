use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::OtpType;

// =============================================================================
// REQUEST OTP
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub otp_type: OtpType,
}

#[derive(Debug, Serialize)]
pub struct RequestOtpResponse {
    pub message: &'static str,
    /// Only populated outside production, for local flows without a mailbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
}

// =============================================================================
// VERIFY OTP
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp_code: String,
    pub otp_type: OtpType,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub message: &'static str,
    pub user_id: String,
}
