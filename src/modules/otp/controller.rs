use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use super::crud::{OtpCrud, OtpError};
use super::schema::{RequestOtpRequest, RequestOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::modules::auth::schema::ErrorResponse;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn otp_error(e: OtpError) -> ErrorReply {
    let status = e.status_code();
    match e {
        OtpError::RateLimited { time_left_seconds } => (
            status,
            Json(ErrorResponse::with_message(
                e.to_string(),
                format!("Try again in {} seconds", time_left_seconds),
            )),
        ),
        OtpError::Database(_) => {
            tracing::error!(error = %e, "otp operation failed");
            (status, Json(ErrorResponse::new("Internal server error")))
        }
        _ => (status, Json(ErrorResponse::new(e.to_string()))),
    }
}

pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestOtpRequest>,
) -> Result<Json<RequestOtpResponse>, ErrorReply> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = OtpCrud::new(state.db.clone());
    let code = crud.generate(&req.email, req.otp_type).await.map_err(otp_error)?;

    // The code only ever rides the response outside production; real
    // deployments deliver it by email.
    let otp_code = if state.config.app_env.is_production() {
        None
    } else {
        Some(code)
    };

    Ok(Json(RequestOtpResponse {
        message: "Verification code sent",
        otp_code,
    }))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ErrorReply> {
    let crud = OtpCrud::new(state.db.clone());
    let user_id = crud
        .verify(&req.email, &req.otp_code, req.otp_type)
        .await
        .map_err(otp_error)?;

    Ok(Json(VerifyOtpResponse {
        message: "Code verified",
        user_id,
    }))
}
