//! Error responses.
//!
//! Every error leaves the service as JSON `{"error": ..}`, with a `reason`
//! when there is more to say.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payments::AuthorizeError;

/// Wire shape of an error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid request body")]
    InvalidBody,

    #[error("unauthorized")]
    Unauthorized,

    #[error("service unavailable")]
    Unavailable(#[from] AuthorizeError),

    #[error("metrics exporter not installed")]
    MetricsDisabled,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) | ApiError::MetricsDisabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn body(&self) -> ErrorBody {
        let reason = match self {
            ApiError::Unavailable(cause) => Some(cause.to_string()),
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            reason,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
