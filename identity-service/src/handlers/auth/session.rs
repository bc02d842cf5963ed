use service_core::axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse, MeResponse},
        ErrorResponse, MessageResponse,
    },
    middleware::AuthUser,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Exchange identifier and secret for a session token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account pending approval", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many login attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let authenticated = state
        .access_gate
        .authenticate(&req.identifier, Password::new(req.secret))
        .await?;

    Ok(Json(LoginResponse {
        token: authenticated.session.token,
        token_type: "Bearer".to_string(),
        expires_in: authenticated.session.claims.remaining_seconds(),
        identity: authenticated.identity,
    }))
}

/// Revoke the session used to make this request
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out successfully", body = MessageResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.access_gate.revoke(&user.0.claims).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// The identity behind the current session
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Account no longer active", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    Json(MeResponse {
        identity: state.access_gate.describe(&user.0.identity).await,
    })
}
