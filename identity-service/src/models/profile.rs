//! Directory profile attached 1:1 to an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Profile fields captured at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSeed {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Profile {
    pub identity_id: Uuid,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub created_utc: DateTime<Utc>,
}

impl Profile {
    pub fn new(identity_id: Uuid, seed: ProfileSeed) -> Self {
        Self {
            identity_id,
            first_name: seed.first_name.trim().to_string(),
            middle_name: seed
                .middle_name
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            last_name: seed.last_name.trim().to_string(),
            created_utc: Utc::now(),
        }
    }

    /// "Last, First", as the directory lists people.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_last_comma_first() {
        let profile = Profile::new(
            Uuid::new_v4(),
            ProfileSeed {
                first_name: "Juan".to_string(),
                middle_name: Some("  ".to_string()),
                last_name: "Dela Cruz".to_string(),
            },
        );
        assert_eq!(profile.display_name(), "Dela Cruz, Juan");
        assert_eq!(profile.middle_name, None);
    }
}
