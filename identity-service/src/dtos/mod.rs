pub mod auth;
pub mod broadcast;
pub mod identity;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body rendered by `AppError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid credentials")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "pending")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out successfully")]
    pub message: String,
}
