//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`reelhouse_common::Error`] so that route
//! handlers can return `Result<T, AppError>` directly. Client errors keep
//! their precise status codes and machine-readable reason codes; they are
//! never coerced into a different response shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: reelhouse_common::Error,
}

impl AppError {
    pub fn new(inner: reelhouse_common::Error) -> Self {
        Self { inner }
    }
}

impl From<reelhouse_common::Error> for AppError {
    fn from(e: reelhouse_common::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = match &self.inner {
            reelhouse_common::Error::NotFound(_) => "not_found",
            reelhouse_common::Error::InvalidName(_) => "invalid_name",
            reelhouse_common::Error::UnsupportedType(_) => "unsupported_type",
            reelhouse_common::Error::PayloadTooLarge(_) => "payload_too_large",
            reelhouse_common::Error::DuplicateId(_) => "duplicate_id",
            reelhouse_common::Error::InvalidTransition { .. } => "invalid_transition",
            reelhouse_common::Error::Storage(_) => "storage_error",
            reelhouse_common::Error::Io(_) => "io_error",
            reelhouse_common::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
