//! # Response Normalizer
//!
//! Maps a gateway result to an HTTP response. Each route declares one [`Envelope`] in
//! its route table and every response from that route uses it, so clients can
//! destructure predictably and branch on the presence of `error` alone.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::errors::ApiError;

/// Success body shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// The payload itself, e.g. `[ {...}, ... ]`
    Bare,
    /// `{ "data": payload }`
    Data,
    /// `{ "data": payload, "success": true }`
    DataSuccess,
}

impl Envelope {
    /// Wrap a success payload
    pub fn wrap(self, payload: Value) -> Value {
        match self {
            Envelope::Bare => payload,
            Envelope::Data => json!({ "data": payload }),
            Envelope::DataSuccess => json!({ "data": payload, "success": true }),
        }
    }
}

/// Normalize a handler result: 200 with the route's envelope, or the error's status
/// with `{ "error": message }`
pub fn respond(envelope: Envelope, result: Result<Value, ApiError>) -> Response {
    match result {
        Ok(payload) => (StatusCode::OK, Json(envelope.wrap(payload))).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Null from a procedure that returned no rows is an empty list
pub fn rows_or_empty(payload: Value) -> Value {
    match payload {
        Value::Null => Value::Array(Vec::new()),
        other => other,
    }
}
