use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_COMPLETED: &str = "completed";

/// Statuses that occupy the court. Cancelled and completed rows stay in the
/// ledger for history but never block a slot.
pub const LIVE_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_CONFIRMED];

// total_price is DECIMAL in MySQL; queries CAST it to CHAR and it is parsed
// with rust_decimal where arithmetic is needed.
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: String,
    pub court_id: String,
    pub user_id: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub total_price: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BookedInterval {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub user_id: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Court {
    pub id: String,
    pub name: String,
    pub sport_type: String,
    pub hourly_rate: String,
}
