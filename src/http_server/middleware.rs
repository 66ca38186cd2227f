//! Request logging and panic conversion

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;
use crate::observability::{Event, Logger};

use super::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Marks a response produced from a caught panic
#[derive(Debug, Clone, Copy)]
pub struct PanicResponse;

/// Log every request once it completes and count it
pub async fn log_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    state
        .metrics
        .record_request(status.is_client_error() || status.is_server_error());
    if status == StatusCode::BAD_REQUEST {
        state.metrics.increment_validation_rejects();
    }
    if response.extensions().get::<PanicResponse>().is_some() {
        state.metrics.increment_handler_panics();
    }

    let status_text = status.as_u16().to_string();
    let duration_ms = started.elapsed().as_millis().to_string();
    Logger::info(
        Event::RequestComplete.as_str(),
        &[
            ("request_id", request_id.as_str()),
            ("method", method.as_str()),
            ("path", path.as_str()),
            ("status", status_text.as_str()),
            ("duration_ms", duration_ms.as_str()),
        ],
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Turn a handler panic into the generic 500 body
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    let mut response = ApiError::panicked(detail).into_response();
    response.extensions_mut().insert(PanicResponse);
    response
}
