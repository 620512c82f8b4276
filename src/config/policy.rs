//! Security and booking policy constants.
//!
//! Every cooldown, TTL and attempt threshold lives here so the values cannot
//! drift between call sites.

/// OTP codes expire this many minutes after issuance.
pub const OTP_TTL_MINUTES: i64 = 10;

/// A new OTP for the same email cannot be requested within this window.
pub const OTP_RESEND_COOLDOWN_SECS: i64 = 60;

/// Failed verifications allowed before a code is locked.
pub const OTP_MAX_ATTEMPTS: i32 = 5;

/// Password-reset tokens expire this many minutes after issuance.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Session token lifetime.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Refresh token lifetime.
pub const REFRESH_TTL_DAYS: i64 = 7;

/// Failed logins allowed before the account is temporarily locked.
pub const LOGIN_MAX_FAILED_ATTEMPTS: i32 = 5;

/// How long a lockout lasts once triggered.
pub const LOGIN_LOCKOUT_MINUTES: i64 = 15;

/// Minimum accepted password length.
pub const PASSWORD_MIN_LEN: usize = 8;
