//! Mapping of request failures to HTTP error envelopes.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::account::ValidationError;
use crate::metrics;
use crate::store::StoreError;

/// Message returned to clients for unexpected failures. Details are only
/// logged.
const INTERNAL_MESSAGE: &str = "An internal error occurred while processing the request";

/// Failure of a request, one variant per HTTP error class the service emits.
#[derive(Error, Debug, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ApiError {
    /// Malformed or incomplete payload (400).
    #[error("{0}")]
    BadRequest(String),

    /// No resource at the requested location (404).
    #[error("{0}")]
    NotFound(String),

    /// Verb not defined for the path (405).
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Request body over the size limit (413).
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Wrong `Content-Type` header (415).
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Unexpected backend failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::MethodNotAllowed(m)
            | ApiError::PayloadTooLarge(m)
            | ApiError::UnsupportedMediaType(m)
            | ApiError::Internal(m) => m,
        }
    }

    /// Envelope describing this error.
    pub fn envelope(&self) -> ErrorEnvelope {
        let status = self.status();
        ErrorEnvelope {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown Error").to_string(),
            message: self.message().to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(format!("Invalid account data: {err}"))
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(format!("Invalid account data: {}", rejection.body_text()))
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => {
                ApiError::NotFound(format!("Account with id [{id}] could not be found."))
            }
            StoreError::Database(e) => {
                error!(error = %e, "Record store failure");
                ApiError::Internal(INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

/// Uniform JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status (e.g. "Not Found").
    pub error: String,
    /// Human-readable detail. Not stable; do not match on it.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        if self.status().is_server_error() {
            error!(status = envelope.status, "{}", envelope.message);
        } else {
            warn!(status = envelope.status, "{}", envelope.message);
        }
        metrics::inc_api_errors((&self).into());

        (self.status(), Json(envelope)).into_response()
    }
}
