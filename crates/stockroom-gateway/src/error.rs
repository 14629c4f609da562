//! API error types and responses.
//!
//! Client-facing bodies are fixed strings; details stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use stockroom_auth::AuthError;
use stockroom_control::ControlError;

/// Body text for a request without a bearer token.
pub const NO_TOKEN_MESSAGE: &str = "Unauthorized - No Token Provided";
/// Body text for a request whose token did not verify.
pub const INVALID_TOKEN_MESSAGE: &str = "Forbidden - Invalid Token";
/// Body text for a payload the schema refused.
pub const BAD_REQUEST_MESSAGE: &str = "Bad Request";
/// Body text for an oversized payload.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Payload Too Large";
/// Body text for any internal failure.
pub const INTERNAL_MESSAGE: &str = "Something went wrong!";

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token was presented.
    #[error("unauthorized")]
    Unauthorized,

    /// A bearer token was presented but did not verify.
    #[error("forbidden")]
    Forbidden,

    /// The requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The payload was refused; the detail is never sent to the client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured limit.
    #[error("payload too large")]
    PayloadTooLarge,

    /// Internal server error; the detail is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Body shape used by auth and validation failures.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Body shape used by not-found and server failures.
#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Self::Unauthorized => {
                (status, Json(ErrorBody { error: NO_TOKEN_MESSAGE })).into_response()
            }
            Self::Forbidden => {
                (status, Json(ErrorBody { error: INVALID_TOKEN_MESSAGE })).into_response()
            }
            Self::BadRequest(_) => {
                (status, Json(ErrorBody { error: BAD_REQUEST_MESSAGE })).into_response()
            }
            Self::NotFound(message) => (status, Json(MessageBody { message })).into_response(),
            Self::PayloadTooLarge => (
                status,
                Json(MessageBody {
                    message: PAYLOAD_TOO_LARGE_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    status,
                    Json(MessageBody {
                        message: INTERNAL_MESSAGE.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_credential_error() {
            tracing::warn!(error = %err, "Rejected bearer token");
            Self::Forbidden
        } else {
            Self::Internal(format!("authentication failure: {err}"))
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::NotFound { kind, id } => {
                tracing::debug!(%kind, %id, "Record not found");
                Self::NotFound(kind.not_found_message().to_string())
            }
            ControlError::BadRequest(detail) => {
                tracing::debug!(error = %detail, "Payload rejected");
                Self::BadRequest(detail)
            }
            ControlError::Store(store_err) => Self::Internal(format!("storage error: {store_err}")),
        }
    }
}
