//! Live notification stream over Server-Sent Events.

use futures::{Stream, StreamExt};
use service_core::axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use service_core::error::AppError;
use std::convert::Infallible;

use crate::{
    dtos::{broadcast::SubscribeQuery, ErrorResponse},
    middleware::AuthUser,
    models::Channel,
    AppState,
};

/// Subscribe to a broadcast channel. Only events published after the
/// subscription opens are delivered.
#[utoipa::path(
    get,
    path = "/broadcast/subscribe",
    params(SubscribeQuery),
    responses(
        (status = 200, description = "text/event-stream of notification events"),
        (status = 401, description = "Invalid or expired session", body = ErrorResponse),
        (status = 403, description = "Not allowed on this channel", body = ErrorResponse),
        (status = 422, description = "Unknown channel", body = ErrorResponse)
    ),
    tag = "Broadcast",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubscribeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let channel: Channel = query
        .channel
        .parse()
        .map_err(|e: String| AppError::UnprocessableEntity(anyhow::anyhow!(e)))?;

    let subscription = state
        .dispatcher
        .subscribe(&user.0.principal, channel)?;

    let stream = subscription.into_stream().filter_map(|event| async move {
        match Event::default().event(event.event.clone()).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::error!(error = %e, event = %event.event, "Failed to encode event");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
