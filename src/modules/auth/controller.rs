use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    crud::{AuthError, ClientMeta, SessionCrud, UserCrud},
    model::User,
    schema::{
        ErrorResponse, LoginRequest, LoginResponse, LogoutResponse, RefreshRequest,
        RefreshResponse, RegisterRequest, RegisterResponse, SessionStatusResponse,
        UpdateUserStatusRequest, UpdateUserStatusResponse, UserResponse,
    },
};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session_token";

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Translates an AuthError into a wire reply. Internal failures are logged
/// and masked; everything else carries its own message.
pub fn auth_error(e: AuthError) -> ErrorReply {
    let status = e.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "auth operation failed");
        (status, Json(ErrorResponse::new("Internal server error")))
    } else {
        (status, Json(ErrorResponse::new(e.to_string())))
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

pub fn client_meta(headers: &HeaderMap) -> ClientMeta {
    ClientMeta {
        ip_address: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Resolves the calling user from the session cookie. Shared with the
/// booking handlers.
pub async fn current_user(state: &AppState, jar: &CookieJar) -> Result<User, AuthError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AuthError::InvalidSession)?;

    SessionCrud::new(state.db.clone())
        .validate(&token)
        .await?
        .ok_or(AuthError::InvalidSession)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ErrorReply> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .signup(
            &req.email,
            &req.password,
            &req.full_name,
            &req.role,
            req.phone.as_deref(),
            &state.config.argon2,
        )
        .await
        .map_err(auth_error)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ErrorReply> {
    let crud = UserCrud::new(state.db.clone());
    let user = crud.login(&req.email, &req.password).await.map_err(auth_error)?;

    let sessions = SessionCrud::new(state.db.clone());
    let issued = sessions
        .create(&user.id, &client_meta(&headers))
        .await
        .map_err(auth_error)?;

    tracing::info!(user_id = %user.id, "login succeeded");

    let jar = jar.add(session_cookie(issued.session_token));
    Ok((
        jar,
        Json(LoginResponse {
            user: UserResponse::from(user),
            refresh_token: issued.refresh_token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// Best-effort logout: even if revoking the stored session fails, the cookie
/// is cleared so the client ends up logged out.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let sessions = SessionCrud::new(state.db.clone());
        if let Err(e) = sessions.invalidate(cookie.value()).await {
            tracing::warn!(error = %e, "session revoke failed; clearing cookie anyway");
        }
    }

    let jar = jar.add(clear_session_cookie());
    (
        jar,
        Json(LogoutResponse {
            message: "Logged out",
        }),
    )
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<UserResponse>, ErrorReply> {
    let user = current_user(&state, &jar).await.map_err(auth_error)?;
    Ok(Json(UserResponse::from(user)))
}

/// Read-only session check: always 200, with `valid: false` for a missing,
/// expired or revoked token. Validation never extends the session.
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Json<SessionStatusResponse> {
    match current_user(&state, &jar).await {
        Ok(user) => Json(SessionStatusResponse {
            valid: true,
            user: Some(UserResponse::from(user)),
        }),
        Err(_) => Json(SessionStatusResponse {
            valid: false,
            user: None,
        }),
    }
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<RefreshResponse>), ErrorReply> {
    let sessions = SessionCrud::new(state.db.clone());
    let issued = sessions.refresh(&req.refresh_token).await.map_err(auth_error)?;

    let jar = jar.add(session_cookie(issued.session_token));
    Ok((
        jar,
        Json(RefreshResponse {
            refresh_token: issued.refresh_token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// Admin ban/unban. Banning does not delete anything; active sessions die at
/// validation time because `validate` requires an active user.
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserStatusRequest>,
) -> Result<Json<UpdateUserStatusResponse>, ErrorReply> {
    let caller = current_user(&state, &jar).await.map_err(auth_error)?;
    UserCrud::require_admin(&caller).map_err(auth_error)?;

    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .set_active(&user_id, req.is_active)
        .await
        .map_err(auth_error)?;

    // Banning also cuts open sessions immediately rather than waiting for
    // the next validation to notice the inactive flag.
    if !req.is_active {
        let sessions = SessionCrud::new(state.db.clone());
        let revoked = sessions
            .revoke_all_for_user(&user.id)
            .await
            .map_err(AuthError::Database)
            .map_err(auth_error)?;
        tracing::info!(user_id = %user.id, revoked, "sessions revoked on ban");
    }

    tracing::info!(
        admin_id = %caller.id,
        user_id = %user.id,
        is_active = req.is_active,
        "user status updated"
    );

    Ok(Json(UpdateUserStatusResponse {
        message: if req.is_active { "User unbanned" } else { "User banned" },
        user: UserResponse::from(user),
    }))
}
