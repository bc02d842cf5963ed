pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use service_core::axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::{BootstrapReviewerConfig, IdentityConfig};
use crate::models::{ProfileSeed, Role};
use crate::services::{
    AccessGate, ApprovalService, IdentityStore, NotificationDispatcher, ProfileDirectory,
    Registration, ServiceError, SessionRevocationList, SessionService,
};
use crate::utils::Password;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::registration::register,
        handlers::auth::session::login,
        handlers::auth::session::logout,
        handlers::auth::session::me,
        handlers::identity::list_pending,
        handlers::identity::count_pending,
        handlers::identity::list_all,
        handlers::identity::approve,
        handlers::identity::suspend,
        handlers::broadcast::subscribe,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::MeResponse,
            dtos::identity::IdentityListResponse,
            dtos::identity::CountResponse,
            dtos::identity::TransitionResponse,
            models::IdentitySummary,
            models::IdentityStatus,
            models::Role,
            models::NotificationEvent,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and session lifecycle"),
        (name = "Identities", description = "Reviewer approval workflow"),
        (name = "Broadcast", description = "Live workflow notifications"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub store: Arc<dyn IdentityStore>,
    pub revocations: Arc<dyn SessionRevocationList>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub access_gate: AccessGate,
    pub approval_service: ApprovalService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the workflow services over the given backends.
    pub fn new(
        config: IdentityConfig,
        store: Arc<dyn IdentityStore>,
        directory: Arc<dyn ProfileDirectory>,
        revocations: Arc<dyn SessionRevocationList>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            config.broadcast.channel_capacity,
        ));
        let sessions = SessionService::new(&config.session);

        let access_gate = AccessGate::new(
            store.clone(),
            directory.clone(),
            sessions,
            revocations.clone(),
            dispatcher.clone(),
        );
        let approval_service = ApprovalService::new(store.clone(), directory, dispatcher.clone());

        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );
        let register_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.register_attempts,
            config.rate_limit.register_window_seconds,
        );

        Self {
            config,
            store,
            revocations,
            dispatcher,
            access_gate,
            approval_service,
            login_rate_limiter,
            register_rate_limiter,
            metrics,
        }
    }
}

/// Seed the configured reviewer if it does not exist yet. The account is
/// registered pending and then approved like any other, so a reviewer left
/// pending by an interrupted start is approved on the next one.
pub async fn bootstrap_reviewer(
    state: &AppState,
    bootstrap: &BootstrapReviewerConfig,
) -> Result<(), ServiceError> {
    if let Some(existing) = state.store.find_by_identifier(&bootstrap.identifier).await? {
        if existing.role() != Role::Reviewer {
            tracing::error!(
                identity_id = %existing.id,
                "Bootstrap identifier belongs to a non-reviewer account"
            );
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Bootstrap reviewer identifier is registered as a {}",
                existing.role().as_str()
            )));
        }

        let transition = state
            .approval_service
            .approve(existing.id, Role::Reviewer)
            .await?;
        tracing::info!(
            identity_id = %existing.id,
            activated = transition.changed,
            "Bootstrap reviewer already present"
        );
        return Ok(());
    }

    let (identity, _) = state
        .access_gate
        .enroll(
            Registration {
                identifier: bootstrap.identifier.clone(),
                secret: Password::new(bootstrap.secret.expose_secret().clone()),
                profile: ProfileSeed {
                    first_name: "Reviewer".to_string(),
                    middle_name: None,
                    last_name: "Bootstrap".to_string(),
                },
            },
            Role::Reviewer,
        )
        .await?;

    state
        .approval_service
        .approve(identity.id, Role::Reviewer)
        .await?;

    tracing::info!(identity_id = %identity.id, "Bootstrap reviewer created");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let session_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .route("/identities", get(handlers::identity::list_all))
        .route("/identities/pending", get(handlers::identity::list_pending))
        .route(
            "/identities/pending/count",
            get(handlers::identity::count_pending),
        )
        .route("/identities/:id/approve", post(handlers::identity::approve))
        .route("/identities/:id/suspend", post(handlers::identity::suspend))
        .route("/broadcast/subscribe", get(handlers::broadcast::subscribe))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(login_route)
        .merge(register_route)
        .merge(session_routes)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "A backing store is unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Identity store health check failed");
    });
    let revocations = state.revocations.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Revocation list health check failed");
    });

    let status = if store.is_ok() && revocations.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let up = |ok: bool| if ok { "up" } else { "down" };

    (
        status,
        Json(serde_json::json!({
            "status": if status == StatusCode::OK { "healthy" } else { "unhealthy" },
            "service": state.config.service_name,
            "version": state.config.service_version,
            "environment": format!("{:?}", state.config.environment),
            "checks": {
                "store": up(store.is_ok()),
                "revocation_list": up(revocations.is_ok()),
            }
        })),
    )
}

