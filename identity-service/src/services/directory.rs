//! Directory collaborator: owns profile records keyed by identity id.
//!
//! The approval core only creates a profile at registration and reads names
//! back for summaries; profile CRUD lives with the directory itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::{Identity, IdentitySummary, Profile, ProfileSeed};
use crate::services::ServiceError;

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn create_profile(
        &self,
        identity_id: Uuid,
        seed: ProfileSeed,
    ) -> Result<Profile, ServiceError>;

    async fn find_profiles(&self, identity_ids: &[Uuid])
        -> Result<HashMap<Uuid, Profile>, ServiceError>;
}

/// Summaries for `identities`, in order, with names where a profile exists.
///
/// A directory outage degrades to nameless summaries instead of failing the
/// approval workflow.
pub async fn summarize(
    directory: &dyn ProfileDirectory,
    identities: &[Identity],
) -> Vec<IdentitySummary> {
    let ids: Vec<Uuid> = identities.iter().map(|identity| identity.id).collect();
    let profiles = directory.find_profiles(&ids).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Profile lookup failed; returning summaries without names");
        HashMap::new()
    });

    identities
        .iter()
        .map(|identity| identity.summary(profiles.get(&identity.id)))
        .collect()
}

pub async fn summarize_one(directory: &dyn ProfileDirectory, identity: &Identity) -> IdentitySummary {
    summarize(directory, std::slice::from_ref(identity))
        .await
        .pop()
        .unwrap_or_else(|| identity.summary(None))
}

#[derive(Default)]
pub struct InMemoryProfileDirectory {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn create_profile(
        &self,
        identity_id: Uuid,
        seed: ProfileSeed,
    ) -> Result<Profile, ServiceError> {
        let profile = Profile::new(identity_id, seed);
        self.profiles
            .write()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Directory lock poisoned: {}", e)))?
            .insert(identity_id, profile.clone());
        Ok(profile)
    }

    async fn find_profiles(
        &self,
        identity_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Profile>, ServiceError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Directory lock poisoned: {}", e)))?;
        Ok(identity_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[tokio::test]
    async fn test_summarize_keeps_order_and_fills_names() {
        let directory = InMemoryProfileDirectory::new();
        let named = Identity::new("named@example.com", "hash".to_string(), Role::Member);
        let nameless = Identity::new("nameless@example.com", "hash".to_string(), Role::Member);
        directory
            .create_profile(
                named.id,
                ProfileSeed {
                    first_name: "Maria".to_string(),
                    middle_name: None,
                    last_name: "Santos".to_string(),
                },
            )
            .await
            .unwrap();

        let summaries = summarize(&directory, &[nameless.clone(), named.clone()]).await;

        assert_eq!(summaries[0].id, nameless.id);
        assert_eq!(summaries[0].name, None);
        assert_eq!(summaries[1].name.as_deref(), Some("Santos, Maria"));
    }
}
