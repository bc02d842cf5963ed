use service_core::axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{services::SessionContext, AppState};

/// Require a live session: valid token, not revoked, identity still Active.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
    })?;

    let context = state.access_gate.resolve(token).await.map_err(|e| {
        tracing::debug!(error = %e, "Session rejected");
        AppError::from(e)
    })?;

    req.extensions_mut().insert(AuthUser(context));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &service_core::axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Caller resolved by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Session context missing from request extensions"
            ))
        })
    }
}
