//! JSON error responses.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};
use crate::CommerceError;

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
}

impl IntoResponse for CommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, code = self.code(), error = %self, "request failed");
        } else {
            debug!(%status, code = self.code(), error = %self, "request rejected");
        }
        let message = match &self {
            // Driver detail stays in the log.
            CommerceError::Storage(_) => "Internal storage error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { message, code: self.code() })).into_response()
    }
}
