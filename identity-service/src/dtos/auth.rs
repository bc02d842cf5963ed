use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{IdentitySummary, ProfileSeed};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "juan@example.com")]
    pub identifier: String,

    #[validate(length(min = 8, message = "Secret must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub secret: String,

    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    #[schema(example = "Juan")]
    pub first_name: String,

    #[validate(length(max = 255, message = "Middle name is too long"))]
    #[schema(example = "Santos")]
    pub middle_name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    #[schema(example = "Dela Cruz")]
    pub last_name: String,
}

impl RegisterRequest {
    pub fn profile_seed(&self) -> ProfileSeed {
        ProfileSeed {
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "Registration successful. Your account is pending approval.")]
    pub message: String,
    pub identity: IdentitySummary,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    #[schema(example = "juan@example.com")]
    pub identifier: String,

    #[validate(length(min = 1, message = "Secret is required"))]
    #[schema(example = "password123")]
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the session expires.
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub identity: IdentitySummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub identity: IdentitySummary,
}
