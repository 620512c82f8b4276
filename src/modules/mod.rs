pub mod auth;
pub mod booking;
pub mod otp;
pub mod password_reset;
