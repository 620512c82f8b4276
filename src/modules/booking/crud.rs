use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, Pool};
use std::str::FromStr;
use uuid::Uuid;

use super::model::{
    BookedInterval, Booking, Court, LIVE_STATUSES, STATUS_CANCELLED, STATUS_CONFIRMED,
};

// =============================================================================
// BOOKING ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Court not found")]
    CourtNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("The requested time slot is already booked")]
    Conflict,

    #[error("Booking not found")]
    NotFound,

    #[error("Booking can no longer be cancelled")]
    NotCancellable,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::CourtNotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotCancellable => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Half-open interval overlap: `[s1,e1)` and `[s2,e2)` conflict iff
/// `s1 < e2 && s2 < e1`. Bookings that merely touch do not conflict.
pub fn overlaps(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

const BOOKING_COLUMNS: &str = "id, court_id, user_id, booking_date, start_time, end_time, status, \
     CAST(total_price AS CHAR) AS total_price, created_at, updated_at";

/// True for MySQL lock contention errors: 1213 (deadlock victim) and 1205
/// (lock wait timeout). During a booking race InnoDB may pick one inserter
/// as the deadlock victim instead of blocking it; the losing request still
/// means "someone else took the slot".
fn is_lock_contention(e: &sqlx::Error) -> bool {
    let msg = e.to_string();
    msg.contains("1213")
        || msg.contains("Deadlock found")
        || msg.contains("1205")
        || msg.contains("Lock wait timeout")
}

/// `IN (...)` list of the statuses that occupy a slot, for query assembly.
fn live_status_list() -> String {
    LIVE_STATUSES
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// BOOKING CRUD
// =============================================================================

pub struct BookingCrud {
    pool: Pool<MySql>,
}

impl BookingCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn find_court(&self, court_id: &str) -> Result<Option<Court>, sqlx::Error> {
        sqlx::query_as::<_, Court>(
            "SELECT id, name, sport_type, CAST(hourly_rate AS CHAR) AS hourly_rate \
             FROM courts WHERE id = ?",
        )
        .bind(court_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Occupied intervals for a court on a date. Used by the booking UI and
    /// as the read half of the conflict check.
    pub async fn get_availability(
        &self,
        court_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BookedInterval>, BookingError> {
        if self.find_court(court_id).await?.is_none() {
            return Err(BookingError::CourtNotFound);
        }

        let intervals = sqlx::query_as::<_, BookedInterval>(&format!(
            "SELECT start_time, end_time, user_id FROM bookings \
             WHERE court_id = ? AND booking_date = ? AND status IN ({}) \
             ORDER BY start_time",
            live_status_list()
        ))
        .bind(court_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(intervals)
    }

    /// Conflict check and insert in one transaction. The `FOR UPDATE` scan
    /// over the live rows for (court_id, booking_date) — backed by the index
    /// on that pair — serializes concurrent creates for the same court/date,
    /// so two overlapping requests cannot both commit.
    pub async fn create(
        &self,
        court_id: &str,
        user_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Booking, BookingError> {
        if start_time >= end_time {
            return Err(BookingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }
        if date < Utc::now().date_naive() {
            return Err(BookingError::Validation(
                "booking_date cannot be in the past".to_string(),
            ));
        }

        let court = self
            .find_court(court_id)
            .await?
            .ok_or(BookingError::CourtNotFound)?;

        let total_price = compute_price(&court.hourly_rate, start_time, end_time)?;

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, BookedInterval>(&format!(
            "SELECT start_time, end_time, user_id FROM bookings \
             WHERE court_id = ? AND booking_date = ? AND status IN ({}) \
             FOR UPDATE",
            live_status_list()
        ))
        .bind(court_id)
        .bind(date)
        .fetch_all(&mut *tx)
        .await?;

        if existing
            .iter()
            .any(|b| overlaps(start_time, end_time, b.start_time, b.end_time))
        {
            return Err(BookingError::Conflict);
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            court_id: court_id.to_string(),
            user_id: user_id.to_string(),
            booking_date: date,
            start_time,
            end_time,
            status: STATUS_CONFIRMED.to_string(),
            total_price: total_price.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, court_id, user_id, booking_date, start_time, end_time, status, total_price,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.court_id)
        .bind(&booking.user_id)
        .bind(booking.booking_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(&booking.status)
        .bind(&booking.total_price)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // On an empty court/date both racers hold compatible gap locks,
            // so the insert race resolves by deadlock instead of blocking.
            if is_lock_contention(&e) {
                BookingError::Conflict
            } else {
                BookingError::Database(e)
            }
        })?;

        tx.commit().await.map_err(|e| {
            if is_lock_contention(&e) {
                BookingError::Conflict
            } else {
                BookingError::Database(e)
            }
        })?;

        tracing::info!(
            booking_id = %booking.id,
            court_id = %booking.court_id,
            user_id = %booking.user_id,
            "booking created"
        );

        Ok(booking)
    }

    pub async fn find_by_id(&self, booking_id: &str) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Cancellation keeps the row for history; the status guard in the
    /// UPDATE makes a repeated or racing cancel lose cleanly.
    pub async fn cancel(&self, booking_id: &str, caller_id: &str) -> Result<Booking, BookingError> {
        let booking = self
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        if booking.user_id != caller_id {
            return Err(BookingError::Forbidden);
        }

        let slot_end = booking.booking_date.and_time(booking.end_time);
        if slot_end < Utc::now().naive_utc() {
            return Err(BookingError::NotCancellable);
        }

        let result = sqlx::query(&format!(
            "UPDATE bookings SET status = ? WHERE id = ? AND status IN ({})",
            live_status_list()
        ))
        .bind(STATUS_CANCELLED)
        .bind(booking_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BookingError::NotCancellable);
        }

        tracing::info!(booking_id = %booking_id, user_id = %caller_id, "booking cancelled");

        self.find_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE user_id = ? ORDER BY booking_date DESC, start_time DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

fn compute_price(
    hourly_rate: &str,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<Decimal, BookingError> {
    let rate = Decimal::from_str(hourly_rate)
        .map_err(|e| BookingError::Internal(format!("invalid hourly rate: {}", e)))?;
    let minutes = (end_time - start_time).num_minutes();
    let mut price = rate * Decimal::from(minutes) / Decimal::from(60);
    // Forces two decimal places so "750" serializes as "750.00".
    price.rescale(2);
    Ok(price)
}
