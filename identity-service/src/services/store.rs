//! Credential store contract and its in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::{normalize_identifier, Identity, IdentityStatus};
use crate::services::ServiceError;

/// Read/write contract over identity records.
///
/// `compare_and_set_status` is the only way `status` changes after creation and
/// must be atomic: it applies only while the stored status still equals
/// `expected`.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with `DuplicateIdentity` when the identifier is taken.
    async fn insert(&self, identity: &Identity) -> Result<(), ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, ServiceError>;

    async fn find_by_identifier(&self, identifier: &str)
        -> Result<Option<Identity>, ServiceError>;

    /// Newest first. `None` lists every identity.
    async fn list(&self, status: Option<IdentityStatus>) -> Result<Vec<Identity>, ServiceError>;

    async fn count(&self, status: Option<IdentityStatus>) -> Result<i64, ServiceError>;

    /// Returns the updated record, or `None` when the identity is missing or
    /// its status no longer equals `expected`.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: IdentityStatus,
        next: IdentityStatus,
    ) -> Result<Option<Identity>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Process-local store for tests and single-node development.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> ServiceError {
        ServiceError::Internal(anyhow::anyhow!("Identity store lock poisoned: {}", e))
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn insert(&self, identity: &Identity) -> Result<(), ServiceError> {
        let mut identities = self.identities.write().map_err(Self::poisoned)?;

        let taken = identities
            .values()
            .any(|existing| existing.identifier == identity.identifier);
        if taken || identities.contains_key(&identity.id) {
            return Err(ServiceError::DuplicateIdentity);
        }

        identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, ServiceError> {
        let identities = self.identities.read().map_err(Self::poisoned)?;
        Ok(identities.get(&id).cloned())
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Identity>, ServiceError> {
        let identifier = normalize_identifier(identifier);
        let identities = self.identities.read().map_err(Self::poisoned)?;
        Ok(identities
            .values()
            .find(|identity| identity.identifier == identifier)
            .cloned())
    }

    async fn list(&self, status: Option<IdentityStatus>) -> Result<Vec<Identity>, ServiceError> {
        let identities = self.identities.read().map_err(Self::poisoned)?;
        let mut matching: Vec<Identity> = identities
            .values()
            .filter(|identity| status.map_or(true, |s| identity.status() == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_utc.cmp(&a.created_utc).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn count(&self, status: Option<IdentityStatus>) -> Result<i64, ServiceError> {
        let identities = self.identities.read().map_err(Self::poisoned)?;
        let count = identities
            .values()
            .filter(|identity| status.map_or(true, |s| identity.status() == s))
            .count();
        Ok(count as i64)
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: IdentityStatus,
        next: IdentityStatus,
    ) -> Result<Option<Identity>, ServiceError> {
        let mut identities = self.identities.write().map_err(Self::poisoned)?;

        match identities.get_mut(&id) {
            Some(identity) if identity.status() == expected => {
                identity.status_code = next.as_str().to_string();
                Ok(Some(identity.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.identities.read().map_err(Self::poisoned)?;
        Ok(())
    }
}
