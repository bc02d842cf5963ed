//! The single authorization predicate shared by the approval workflow, the
//! reviewer listings and the broadcast subscribe check.

use uuid::Uuid;

use crate::models::{Channel, Role};
use crate::services::ServiceError;

/// Authenticated caller, resolved from a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub identity_id: Uuid,
    pub role: Role,
}

/// Whether `role` may review accounts (drive transitions, see the pending queue).
pub fn can_review(role: Role) -> bool {
    matches!(role, Role::Reviewer)
}

pub fn require_reviewer(role: Role) -> Result<(), ServiceError> {
    if can_review(role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

/// Reviewers may listen on the reviewer channel; each identity only on its own.
pub fn can_subscribe(principal: &Principal, channel: &Channel) -> bool {
    match channel {
        Channel::ReviewerBroadcast => can_review(principal.role),
        Channel::UserBroadcast(owner) => *owner == principal.identity_id,
    }
}
