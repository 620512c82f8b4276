use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use super::crud::{BookingCrud, BookingError};
use super::schema::{
    AvailabilityQuery, AvailabilityResponse, BookedIntervalResponse, BookingResponse,
    CancelBookingResponse, CreateBookingRequest, CreateBookingResponse, MyBookingsResponse,
};
use crate::modules::auth::controller::{auth_error, current_user};
use crate::modules::auth::schema::ErrorResponse;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn booking_error(e: BookingError) -> ErrorReply {
    let status = e.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "booking operation failed");
        (status, Json(ErrorResponse::new("Internal server error")))
    } else {
        (status, Json(ErrorResponse::new(e.to_string())))
    }
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ErrorReply> {
    let crud = BookingCrud::new(state.db.clone());
    let intervals = crud
        .get_availability(&query.court_id, query.date)
        .await
        .map_err(booking_error)?;

    Ok(Json(AvailabilityResponse {
        court_id: query.court_id,
        date: query.date,
        booked_intervals: intervals
            .into_iter()
            .map(|i| BookedIntervalResponse {
                start_time: i.start_time,
                end_time: i.end_time,
                booked_by: i.user_id,
            })
            .collect(),
    }))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), ErrorReply> {
    let user = current_user(&state, &jar).await.map_err(auth_error)?;

    let crud = BookingCrud::new(state.db.clone());
    let booking = crud
        .create(&req.court_id, &user.id, req.date, req.start_time, req.end_time)
        .await
        .map_err(booking_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            message: "Booking confirmed",
            booking: BookingResponse::from(booking),
        }),
    ))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(booking_id): Path<String>,
) -> Result<Json<CancelBookingResponse>, ErrorReply> {
    let user = current_user(&state, &jar).await.map_err(auth_error)?;

    let crud = BookingCrud::new(state.db.clone());
    let booking = crud
        .cancel(&booking_id, &user.id)
        .await
        .map_err(booking_error)?;

    Ok(Json(CancelBookingResponse {
        message: "Booking cancelled",
        booking: BookingResponse::from(booking),
    }))
}

pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<MyBookingsResponse>, ErrorReply> {
    let user = current_user(&state, &jar).await.map_err(auth_error)?;

    let crud = BookingCrud::new(state.db.clone());
    let bookings = crud.list_for_user(&user.id).await.map_err(|e| {
        tracing::error!(error = %e, "booking history lookup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Internal server error")),
        )
    })?;

    Ok(Json(MyBookingsResponse {
        bookings: bookings.into_iter().map(BookingResponse::from).collect(),
    }))
}
