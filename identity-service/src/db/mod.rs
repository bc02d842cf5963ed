//! PostgreSQL pool setup and schema migrations.

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Open the connection pool used by the identity store and profile directory.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    Ok(pool)
}

/// Apply the embedded `identities`/`profiles` migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Applying identity schema migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Identity schema is up to date");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn test_pool_connects_and_migrates() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/identity_test".to_string()),
            max_connections: 2,
            min_connections: 1,
            acquire_timeout_seconds: 5,
        };

        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert!(health_check(&pool).await.is_ok());
    }
}
