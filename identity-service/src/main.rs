use identity_service::{
    bootstrap_reviewer, build_router,
    config::IdentityConfig,
    db,
    services::{Database, RedisRevocationList},
    AppState,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = IdentityConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    let recorder = PrometheusBuilder::new().build_recorder();
    let metrics_handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to install metrics recorder: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting identity service"
    );

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    let database = Arc::new(Database::new(pool));
    tracing::info!("Database initialized successfully");

    let revocations = Arc::new(
        RedisRevocationList::new(&config.redis)
            .await
            .map_err(AppError::InternalError)?,
    );
    tracing::info!("Revocation list initialized");

    let state = AppState::new(
        config.clone(),
        database.clone(),
        database,
        revocations,
        Some(metrics_handle),
    );

    if let Some(bootstrap) = &config.bootstrap {
        bootstrap_reviewer(&state, bootstrap).await?;
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
