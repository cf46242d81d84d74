use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A JSON body that is deserialized and then checked with `garde`.
///
/// A body over the size limit is `AppError::PayloadTooLarge` (413); any other
/// failure, including an unreadable body, is `AppError::Validation` (400).
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + garde::Validate<Context = ()>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("❌ Unreadable body: {}", rejection.body_text());
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge
                } else {
                    AppError::Validation("Failed to read body".to_string())
                }
            })?;

        value.validate()?;
        Ok(Self(value))
    }
}
