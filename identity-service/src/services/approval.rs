//! Approval state machine: the only writer of `Identity::status`.
//!
//! ```text
//!            approve
//!   Pending ─────────▶ Active
//!      ▲                  │
//!      └──────────────────┘
//!            suspend
//! ```
//!
//! Transitions go through the store's compare-and-set, so concurrent callers
//! are totally ordered per identity. A call that finds the identity already
//! in the target state succeeds without announcing anything; only the call
//! whose compare-and-set applied emits a notification.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Channel, EventKind, Identity, IdentityStatus, IdentitySummary, Role};
use crate::services::directory::{summarize, summarize_one};
use crate::services::policy::require_reviewer;
use crate::services::{IdentityStore, NotificationDispatcher, ProfileDirectory, ServiceError};

/// Extra compare-and-set attempts after a lost race.
const MAX_CAS_RETRIES: usize = 1;

/// Outcome of `approve`/`suspend`.
#[derive(Debug, Clone)]
pub struct Transition {
    pub identity: IdentitySummary,
    /// Whether this call changed the stored status.
    pub changed: bool,
}

#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn IdentityStore>,
    directory: Arc<dyn ProfileDirectory>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ApprovalService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        directory: Arc<dyn ProfileDirectory>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            directory,
            dispatcher,
        }
    }

    /// Pending → Active.
    pub async fn approve(
        &self,
        identity_id: Uuid,
        acting_role: Role,
    ) -> Result<Transition, ServiceError> {
        self.transition(identity_id, acting_role, IdentityStatus::Active)
            .await
    }

    /// Active → Pending.
    pub async fn suspend(
        &self,
        identity_id: Uuid,
        acting_role: Role,
    ) -> Result<Transition, ServiceError> {
        self.transition(identity_id, acting_role, IdentityStatus::Pending)
            .await
    }

    /// Accounts awaiting review, newest first.
    pub async fn list_pending(&self, acting_role: Role) -> Result<Vec<IdentitySummary>, ServiceError> {
        require_reviewer(acting_role)?;
        let pending = self.store.list(Some(IdentityStatus::Pending)).await?;
        Ok(summarize(self.directory.as_ref(), &pending).await)
    }

    pub async fn count_pending(&self, acting_role: Role) -> Result<i64, ServiceError> {
        require_reviewer(acting_role)?;
        self.store.count(Some(IdentityStatus::Pending)).await
    }

    /// Every account, newest first.
    pub async fn list_all(&self, acting_role: Role) -> Result<Vec<IdentitySummary>, ServiceError> {
        require_reviewer(acting_role)?;
        let identities = self.store.list(None).await?;
        Ok(summarize(self.directory.as_ref(), &identities).await)
    }

    async fn transition(
        &self,
        identity_id: Uuid,
        acting_role: Role,
        target: IdentityStatus,
    ) -> Result<Transition, ServiceError> {
        // Role first: members learn nothing about which ids exist.
        require_reviewer(acting_role)?;

        let mut current = self.load(identity_id).await?;

        for attempt in 0..=MAX_CAS_RETRIES {
            let observed = current.status();
            if observed == target {
                return Ok(self.unchanged(&current).await);
            }

            match self
                .store
                .compare_and_set_status(identity_id, observed, target)
                .await?
            {
                Some(updated) => return Ok(self.committed(&updated, target).await),
                None => {
                    tracing::debug!(
                        identity_id = %identity_id,
                        attempt,
                        expected = %observed,
                        "Status changed underneath transition; re-reading"
                    );
                    current = self.load(identity_id).await?;
                }
            }
        }

        // Still contended after the retry: report what is stored, announce nothing.
        Ok(self.unchanged(&current).await)
    }

    async fn load(&self, identity_id: Uuid) -> Result<Identity, ServiceError> {
        self.store
            .find_by_id(identity_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    async fn unchanged(&self, identity: &Identity) -> Transition {
        tracing::debug!(
            identity_id = %identity.id,
            status = %identity.status(),
            "Transition is a no-op"
        );
        Transition {
            identity: summarize_one(self.directory.as_ref(), identity).await,
            changed: false,
        }
    }

    async fn committed(&self, identity: &Identity, target: IdentityStatus) -> Transition {
        let summary = summarize_one(self.directory.as_ref(), identity).await;

        let (kind, label, message) = match target {
            IdentityStatus::Active => (
                EventKind::IdentityActivated,
                "approve",
                "Your account has been activated. You can now log in.",
            ),
            IdentityStatus::Pending => (
                EventKind::IdentitySuspended,
                "suspend",
                "Your account has been deactivated.",
            ),
        };

        tracing::info!(identity_id = %identity.id, status = %target, "Identity status changed");
        metrics::counter!("identity_transitions_total", "transition" => label).increment(1);

        self.dispatcher.publish(
            Channel::UserBroadcast(identity.id),
            kind,
            serde_json::json!({ "identity": &summary, "message": message }),
        );

        Transition {
            identity: summary,
            changed: true,
        }
    }
}
