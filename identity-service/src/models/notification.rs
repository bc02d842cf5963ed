//! Broadcast channels and the events published on them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

const REVIEWER_BROADCAST: &str = "reviewer-broadcast";
const USER_BROADCAST_PREFIX: &str = "user-broadcast:";

/// Logical broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Shared by every reviewer.
    ReviewerBroadcast,
    /// Private to one identity.
    UserBroadcast(Uuid),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::ReviewerBroadcast => f.write_str(REVIEWER_BROADCAST),
            Channel::UserBroadcast(id) => write!(f, "{}{}", USER_BROADCAST_PREFIX, id),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == REVIEWER_BROADCAST {
            return Ok(Channel::ReviewerBroadcast);
        }

        s.strip_prefix(USER_BROADCAST_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(Channel::UserBroadcast)
            .ok_or_else(|| format!("Unknown channel: {}", s))
    }
}

/// Event names announced by the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    IdentityRegistered,
    IdentityActivated,
    IdentitySuspended,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::IdentityRegistered => "identity.registered",
            EventKind::IdentityActivated => "identity.activated",
            EventKind::IdentitySuspended => "identity.suspended",
        }
    }
}

/// Immutable event in transit to subscribers. Never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationEvent {
    #[schema(example = "reviewer-broadcast")]
    pub channel: String,
    #[schema(example = "identity.registered")]
    pub event: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(channel: Channel, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            channel: channel.to_string(),
            event: kind.as_str().to_string(),
            payload,
            emitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names_parse_back() {
        let id = Uuid::new_v4();
        let user = Channel::UserBroadcast(id);

        assert_eq!(user.to_string(), format!("user-broadcast:{}", id));
        assert_eq!(user.to_string().parse::<Channel>().unwrap(), user);
        assert_eq!(
            "reviewer-broadcast".parse::<Channel>().unwrap(),
            Channel::ReviewerBroadcast
        );
    }

    #[test]
    fn test_unknown_channels_are_rejected() {
        assert!("hr-notifications".parse::<Channel>().is_err());
        assert!("user-broadcast:42".parse::<Channel>().is_err());
        assert!("user-broadcast:".parse::<Channel>().is_err());
    }
}
