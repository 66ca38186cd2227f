//! # API Errors
//!
//! Route-boundary error taxonomy:
//!
//! - `Validation` → 400, rejected before any gateway call
//! - `Gateway` → 500, remote message echoed to the client
//! - `Unexpected` → 500, generic message, detail only in the server log
//! - `Panicked` → 500, same body as `Unexpected`, logged as a handler panic
//!
//! Every error body is `{ "error": "<message>" }` and nothing else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::observability::{log_event_with_fields, Event};

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for any failure that is not validation or gateway
pub const UNEXPECTED_MESSAGE: &str = "Internal server error";

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request parameter
    #[error("{0}")]
    Validation(String),

    /// Downstream query or procedure failure
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Anything else escaping a handler; the detail is never sent to the client
    #[error("Internal server error")]
    Unexpected(String),

    /// A handler panicked; built only by the panic-catching layer
    #[error("Internal server error")]
    Panicked(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::Unexpected(detail.into())
    }

    pub fn panicked(detail: impl Into<String>) -> Self {
        Self::Panicked(detail.into())
    }

    /// Event logged when this error becomes a response; gateway failures are logged
    /// with call detail by the gateway tier
    pub fn log_event(&self) -> Option<Event> {
        match self {
            ApiError::Validation(_) => Some(Event::ValidationRejected),
            ApiError::Gateway(_) => None,
            ApiError::Unexpected(_) => Some(Event::UnexpectedError),
            ApiError::Panicked(_) => Some(Event::HandlerPanic),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unexpected(_) | ApiError::Panicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let field = match &self {
            ApiError::Validation(message) => Some(("message", message.as_str())),
            ApiError::Unexpected(detail) | ApiError::Panicked(detail) => {
                Some(("detail", detail.as_str()))
            }
            ApiError::Gateway(_) => None,
        };
        if let (Some(event), Some(field)) = (self.log_event(), field) {
            log_event_with_fields(event, &[field]);
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::validation("guide_year parameter is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(GatewayError::remote(404, "missing")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::unexpected("index out of bounds").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::validation("guide_year parameter is required").to_string(),
            "guide_year parameter is required"
        );
        assert_eq!(
            ApiError::from(GatewayError::remote(500, "statement timeout")).to_string(),
            "statement timeout"
        );
        assert_eq!(
            ApiError::unexpected("secret detail").to_string(),
            UNEXPECTED_MESSAGE
        );
    }

    #[test]
    fn test_only_panics_log_as_handler_panic() {
        assert_eq!(
            ApiError::unexpected("serialize failed").log_event(),
            Some(Event::UnexpectedError)
        );
        assert_eq!(
            ApiError::panicked("index out of bounds").log_event(),
            Some(Event::HandlerPanic)
        );
        assert_eq!(
            ApiError::validation("page must be a positive integer").log_event(),
            Some(Event::ValidationRejected)
        );
        assert_eq!(ApiError::from(GatewayError::remote(500, "x")).log_event(), None);
        assert_eq!(ApiError::panicked("secret").to_string(), UNEXPECTED_MESSAGE);
    }

    #[test]
    fn test_error_body_has_only_error_field() {
        let body = serde_json::to_value(ErrorBody::new("boom")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "boom"}));
    }
}
