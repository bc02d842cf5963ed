use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    /// Unknown identifier or wrong secret; callers cannot tell which.
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Account is not active")]
    AccountNotActive,

    #[error("Identifier already registered")]
    DuplicateIdentity,

    #[error("Identity not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid or revoked session")]
    InvalidSession,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredential => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountNotActive => AppError::Forbidden(
                anyhow::anyhow!(
                    "Your account is pending approval. Please wait for a reviewer to activate it."
                ),
                Some("pending".to_string()),
            ),
            ServiceError::DuplicateIdentity => {
                AppError::UnprocessableEntity(anyhow::anyhow!("Identifier already registered"))
            }
            ServiceError::NotFound => AppError::NotFound(anyhow::anyhow!("Identity not found")),
            ServiceError::Forbidden => {
                AppError::Forbidden(anyhow::anyhow!("Unauthorized. Reviewer access only."), None)
            }
            ServiceError::ValidationFailed(e) => AppError::UnprocessableEntity(anyhow::anyhow!(e)),
            ServiceError::InvalidSession => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session"))
            }
        }
    }
}
