use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::IdentitySummary;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdentityListResponse {
    pub count: usize,
    pub identities: Vec<IdentitySummary>,
}

impl From<Vec<IdentitySummary>> for IdentityListResponse {
    fn from(identities: Vec<IdentitySummary>) -> Self {
        Self {
            count: identities.len(),
            identities,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    #[schema(example = 3)]
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionResponse {
    #[schema(example = "Identity activated")]
    pub message: String,
    /// False when the identity was already in the requested state.
    pub changed: bool,
    pub identity: IdentitySummary,
}
