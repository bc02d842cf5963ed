//! Reviewer endpoints: the pending queue and status transitions.

use service_core::axum::{
    extract::{rejection::PathRejection, Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        identity::{CountResponse, IdentityListResponse, TransitionResponse},
        ErrorResponse,
    },
    middleware::AuthUser,
    services::Transition,
    AppState,
};

/// Accounts awaiting approval, newest first
#[utoipa::path(
    get,
    path = "/identities/pending",
    responses(
        (status = 200, description = "Pending identities", body = IdentityListResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Reviewer access only", body = ErrorResponse)
    ),
    tag = "Identities",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_pending(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let pending = state
        .approval_service
        .list_pending(user.0.principal.role)
        .await?;
    Ok(Json(IdentityListResponse::from(pending)))
}

/// Number of accounts awaiting approval
#[utoipa::path(
    get,
    path = "/identities/pending/count",
    responses(
        (status = 200, description = "Pending count", body = CountResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Reviewer access only", body = ErrorResponse)
    ),
    tag = "Identities",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn count_pending(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let count = state
        .approval_service
        .count_pending(user.0.principal.role)
        .await?;
    Ok(Json(CountResponse { count }))
}

/// Every account, newest first
#[utoipa::path(
    get,
    path = "/identities",
    responses(
        (status = 200, description = "All identities", body = IdentityListResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Reviewer access only", body = ErrorResponse)
    ),
    tag = "Identities",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let identities = state.approval_service.list_all(user.0.principal.role).await?;
    Ok(Json(IdentityListResponse::from(identities)))
}

/// Activate a pending account. Approving an active account is a no-op.
#[utoipa::path(
    post,
    path = "/identities/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Identity id")
    ),
    responses(
        (status = 200, description = "Identity is active", body = TransitionResponse),
        (status = 400, description = "Malformed identity id", body = ErrorResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Reviewer access only", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse)
    ),
    tag = "Identities",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = identity_id(id)?;
    let transition = state
        .approval_service
        .approve(id, user.0.principal.role)
        .await?;

    tracing::info!(
        reviewer_id = %user.0.principal.identity_id,
        identity_id = %id,
        changed = transition.changed,
        "Approve requested"
    );

    Ok(Json(transition_response(
        transition,
        "Identity activated",
        "Identity is already active",
    )))
}

/// Return an active account to pending. Suspending a pending account is a no-op.
#[utoipa::path(
    post,
    path = "/identities/{id}/suspend",
    params(
        ("id" = Uuid, Path, description = "Identity id")
    ),
    responses(
        (status = 200, description = "Identity is pending", body = TransitionResponse),
        (status = 400, description = "Malformed identity id", body = ErrorResponse),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Reviewer access only", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse)
    ),
    tag = "Identities",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn suspend(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = identity_id(id)?;
    let transition = state
        .approval_service
        .suspend(id, user.0.principal.role)
        .await?;

    tracing::info!(
        reviewer_id = %user.0.principal.identity_id,
        identity_id = %id,
        changed = transition.changed,
        "Suspend requested"
    );

    Ok(Json(transition_response(
        transition,
        "Identity deactivated",
        "Identity is already pending",
    )))
}

fn identity_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Invalid identity id: {}", e.body_text()))
    })
}

fn transition_response(
    transition: Transition,
    changed: &str,
    unchanged: &str,
) -> TransitionResponse {
    TransitionResponse {
        message: if transition.changed { changed } else { unchanged }.to_string(),
        changed: transition.changed,
        identity: transition.identity,
    }
}
