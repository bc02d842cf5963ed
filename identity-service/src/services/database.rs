//! PostgreSQL-backed identity store and profile directory.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{normalize_identifier, Identity, IdentityStatus, Profile, ProfileSeed};
use crate::services::{IdentityStore, ProfileDirectory, ServiceError};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_insert_error(e: sqlx::Error) -> ServiceError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ServiceError::DuplicateIdentity
        }
        _ => ServiceError::Database(e),
    }
}

#[async_trait]
impl IdentityStore for Database {
    async fn insert(&self, identity: &Identity) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, identifier, credential_hash, role_code, status_code, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(identity.id)
        .bind(&identity.identifier)
        .bind(&identity.credential_hash)
        .bind(&identity.role_code)
        .bind(&identity.status_code)
        .bind(identity.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, ServiceError> {
        Ok(
            sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Identity>, ServiceError> {
        Ok(sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities WHERE LOWER(identifier) = $1",
        )
        .bind(normalize_identifier(identifier))
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list(&self, status: Option<IdentityStatus>) -> Result<Vec<Identity>, ServiceError> {
        Ok(sqlx::query_as::<_, Identity>(
            r#"
            SELECT * FROM identities
            WHERE ($1::TEXT IS NULL OR status_code = $1)
            ORDER BY created_utc DESC, id
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self, status: Option<IdentityStatus>) -> Result<i64, ServiceError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM identities WHERE ($1::TEXT IS NULL OR status_code = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: IdentityStatus,
        next: IdentityStatus,
    ) -> Result<Option<Identity>, ServiceError> {
        Ok(sqlx::query_as::<_, Identity>(
            r#"
            UPDATE identities SET status_code = $3
            WHERE id = $1 AND status_code = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        crate::db::health_check(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            ServiceError::Database(e)
        })
    }
}

#[async_trait]
impl ProfileDirectory for Database {
    async fn create_profile(
        &self,
        identity_id: Uuid,
        seed: ProfileSeed,
    ) -> Result<Profile, ServiceError> {
        let profile = Profile::new(identity_id, seed);
        sqlx::query(
            r#"
            INSERT INTO profiles (identity_id, first_name, middle_name, last_name, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(profile.identity_id)
        .bind(&profile.first_name)
        .bind(&profile.middle_name)
        .bind(&profile.last_name)
        .bind(profile.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn find_profiles(
        &self,
        identity_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Profile>, ServiceError> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE identity_id = ANY($1)",
        )
        .bind(identity_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles
            .into_iter()
            .map(|profile| (profile.identity_id, profile))
            .collect())
    }
}
