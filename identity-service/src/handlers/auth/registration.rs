use service_core::axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{RegisterRequest, RegisterResponse},
        ErrorResponse,
    },
    services::Registration,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Register a new account. It stays pending until a reviewer approves it.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered, pending approval", body = RegisterResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 422, description = "Validation error or identifier already registered", body = ErrorResponse),
        (status = 429, description = "Too many registration attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = req.profile_seed();
    let identity = state
        .access_gate
        .register(Registration {
            identifier: req.identifier,
            secret: Password::new(req.secret),
            profile,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Your account is pending approval.".to_string(),
            identity,
        }),
    ))
}
