use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

use crate::services::ServiceError;

/// JSON body extractor that runs `validator` rules before the handler.
///
/// Malformed JSON or a missing content type is a 400. Missing or mistyped
/// fields and rule violations are a 422.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(e) => {
                    ServiceError::ValidationFailed(e.body_text()).into()
                }
                other => AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", other)),
            })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
