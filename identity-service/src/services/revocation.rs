use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::collections::HashSet;
use std::sync::Mutex;

/// Revoked session ids. Revoking an already revoked id is a no-op.
#[async_trait]
pub trait SessionRevocationList: Send + Sync {
    /// Remember `session_id` as revoked for `expiry_seconds` (its remaining lifetime).
    async fn revoke(&self, session_id: &str, expiry_seconds: i64) -> Result<(), anyhow::Error>;
    async fn is_revoked(&self, session_id: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisRevocationList {
    manager: ConnectionManager,
}

impl RedisRevocationList {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // ConnectionManager reconnects on its own
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self { manager })
    }

    fn key(session_id: &str) -> String {
        format!("revoked-session:{}", session_id)
    }
}

#[async_trait]
impl SessionRevocationList for RedisRevocationList {
    async fn revoke(&self, session_id: &str, expiry_seconds: i64) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();

        redis::cmd("SET")
            .arg(Self::key(session_id))
            .arg("revoked")
            .arg("EX")
            .arg(expiry_seconds.max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to revoke session: {}", e))
    }

    async fn is_revoked(&self, session_id: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();

        let exists: bool = redis::cmd("EXISTS")
            .arg(Self::key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check revocation: {}", e))?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// Process-local revocation list. Entries never expire.
#[derive(Default)]
pub struct InMemoryRevocationList {
    revoked: Mutex<HashSet<String>>,
}

impl InMemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRevocationList for InMemoryRevocationList {
    async fn revoke(&self, session_id: &str, _expiry_seconds: i64) -> Result<(), anyhow::Error> {
        self.revoked
            .lock()
            .map_err(|e| anyhow::anyhow!("Revocation list mutex poisoned: {}", e))?
            .insert(session_id.to_string());
        Ok(())
    }

    async fn is_revoked(&self, session_id: &str) -> Result<bool, anyhow::Error> {
        let contains = self
            .revoked
            .lock()
            .map_err(|e| anyhow::anyhow!("Revocation list mutex poisoned: {}", e))?
            .contains(session_id);
        Ok(contains)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
