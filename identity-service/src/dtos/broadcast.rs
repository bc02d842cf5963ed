use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscribeQuery {
    /// `reviewer-broadcast` or `user-broadcast:{identity id}`.
    #[param(example = "reviewer-broadcast")]
    pub channel: String,
}
