use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::crud::{ResetCrud, ResetError};
use super::schema::{
    ForgotPasswordRequest, ForgotPasswordResponse, ResetPasswordRequest, ResetPasswordResponse,
    ResetTokenInfoResponse,
};
use crate::modules::auth::schema::ErrorResponse;
use crate::services::token;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn reset_error(e: ResetError) -> ErrorReply {
    let status = e.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "password reset operation failed");
        (status, Json(ErrorResponse::new("Internal server error")))
    } else {
        (status, Json(ErrorResponse::new(e.to_string())))
    }
}

/// The response is byte-identical whether or not the email maps to an
/// account; only the side effect (token row + email hand-off) differs.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ErrorReply> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = ResetCrud::new(state.db.clone());
    match crud.issue(&req.email).await {
        Ok(Some(_raw_token)) => {
            // Hand-off to the mailer happens here; the raw token never
            // appears in the response or the logs.
        }
        Ok(None) => {}
        Err(e) => return Err(reset_error(e)),
    }

    Ok(Json(ForgotPasswordResponse {
        message: "If an account exists for that email, a reset link has been sent",
    }))
}

pub async fn reset_token_info(
    State(state): State<Arc<AppState>>,
    Path(raw_token): Path<String>,
) -> Result<Json<ResetTokenInfoResponse>, ErrorReply> {
    let crud = ResetCrud::new(state.db.clone());
    let info = crud.get_info(&raw_token).await.map_err(|e| {
        tracing::error!(error = %e, "reset token lookup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Internal server error")),
        )
    })?;

    Ok(Json(match info {
        Some(info) => ResetTokenInfoResponse {
            valid: true,
            email: Some(token::mask_email(&info.email)),
            expires_at: Some(info.expires_at),
        },
        None => ResetTokenInfoResponse {
            valid: false,
            email: None,
            expires_at: None,
        },
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, ErrorReply> {
    let crud = ResetCrud::new(state.db.clone());
    crud.consume(&req.token, &req.password, &state.config.argon2)
        .await
        .map_err(reset_error)?;

    Ok(Json(ResetPasswordResponse {
        message: "Password has been reset",
    }))
}
