//! JSON body extraction that answers with the service's error body.

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use crate::CommerceError;

/// `Json<T>` whose rejections (wrong content type, syntax, wrong field types)
/// become `CommerceError::Validation`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CommerceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(CommerceError::Validation(rejection.body_text())),
        }
    }
}

/// Webhook bodies that fail to parse are malformed notifications, not client validation errors.
pub fn malformed_webhook(rejection: JsonRejection) -> CommerceError {
    CommerceError::MalformedWebhook(rejection.body_text())
}
