use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Booking, STATUS_COMPLETED};

// =============================================================================
// AVAILABILITY
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub court_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct BookedIntervalResponse {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub booked_by: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub court_id: String,
    pub date: NaiveDate,
    pub booked_intervals: Vec<BookedIntervalResponse>,
}

// =============================================================================
// CREATE / CANCEL / HISTORY
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub court_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub court_id: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub total_price: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let status = effective_status(&booking).to_string();
        Self {
            id: booking.id,
            court_id: booking.court_id,
            booking_date: booking.booking_date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status,
            total_price: booking.total_price,
        }
    }
}

/// A confirmed booking whose slot has passed reads as completed. The row
/// itself is not rewritten; there is no background job.
fn effective_status(booking: &Booking) -> &str {
    if booking.status == super::model::STATUS_CONFIRMED {
        let end = booking.booking_date.and_time(booking.end_time);
        // Bookings whose end time wraps midnight are stored as ending at
        // 00:00 the same date; treat those as ending next day.
        let end = if booking.end_time == NaiveTime::MIN {
            end + Duration::days(1)
        } else {
            end
        };
        if end < Utc::now().naive_utc() {
            return STATUS_COMPLETED;
        }
    }
    &booking.status
}

#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    pub message: &'static str,
    pub booking: BookingResponse,
}

#[derive(Debug, Serialize)]
pub struct MyBookingsResponse {
    pub bookings: Vec<BookingResponse>,
}

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub message: &'static str,
    pub booking: BookingResponse,
}
