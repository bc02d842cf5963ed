//! Identity model - one registerable account and its approval status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Profile;

/// Approval status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    Pending,
    Active,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Pending => "pending",
            IdentityStatus::Active => "active",
        }
    }
}

impl FromStr for IdentityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "inactive" => Ok(IdentityStatus::Pending),
            "active" => Ok(IdentityStatus::Active),
            _ => Err(format!("Invalid identity status: {}", s)),
        }
    }
}

impl fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account roles. `hr` and `admin` are accepted as aliases of `reviewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Reviewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Reviewer => "reviewer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" | "employee" => Ok(Role::Member),
            "reviewer" | "hr" | "admin" => Ok(Role::Reviewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity entity as stored.
#[derive(Clone, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub identifier: String,
    pub credential_hash: String,
    pub role_code: String,
    pub status_code: String,
    pub created_utc: DateTime<Utc>,
}

impl Identity {
    /// Create a new identity. Every identity starts out pending review.
    pub fn new(identifier: &str, credential_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: normalize_identifier(identifier),
            credential_hash,
            role_code: role.as_str().to_string(),
            status_code: IdentityStatus::Pending.as_str().to_string(),
            created_utc: Utc::now(),
        }
    }

    /// Unknown codes read as `Member`, never granting review rights.
    pub fn role(&self) -> Role {
        self.role_code.parse().unwrap_or(Role::Member)
    }

    /// Unknown codes read as `Pending`, never granting a session.
    pub fn status(&self) -> IdentityStatus {
        self.status_code.parse().unwrap_or(IdentityStatus::Pending)
    }

    pub fn is_active(&self) -> bool {
        self.status() == IdentityStatus::Active
    }

    pub fn summary(&self, profile: Option<&Profile>) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            identifier: self.identifier.clone(),
            name: profile.map(Profile::display_name),
            role: self.role(),
            status: self.status(),
            created_at: self.created_utc,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("credential_hash", &"<redacted>")
            .field("role_code", &self.role_code)
            .field("status_code", &self.status_code)
            .field("created_utc", &self.created_utc)
            .finish()
    }
}

/// Identifiers are unique case-insensitively and stored lowercased.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Identity as shown to clients and in broadcast payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IdentitySummary {
    pub id: Uuid,
    #[schema(example = "juan@example.com")]
    pub identifier: String,
    #[schema(example = "Dela Cruz, Juan")]
    pub name: Option<String>,
    pub role: Role,
    pub status: IdentityStatus,
    pub created_at: DateTime<Utc>,
}
