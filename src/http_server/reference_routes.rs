//! Reference Table HTTP Routes
//!
//! Small public lookup tables read whole with the anonymous key.

use std::sync::Arc;

use axum::{extract::State, response::Response, routing::get, Router};
use serde_json::Value;

use crate::api::{respond, ApiResult, Envelope};
use crate::gateway::OrderBy;

use super::state::AppState;

pub const LAND_USE_CODES: &str = "land_use_codes";
pub const TAX_STATUSES: &str = "tax_statuses";

/// Create reference table routes
pub fn reference_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/land-use-codes", get(land_use_codes_handler))
        .route("/tax-statuses", get(tax_statuses_handler))
        .with_state(state)
}

async fn land_use_codes_handler(State(state): State<Arc<AppState>>) -> Response {
    respond(Envelope::Bare, code_table(&state, LAND_USE_CODES).await)
}

async fn tax_statuses_handler(State(state): State<Arc<AppState>>) -> Response {
    respond(Envelope::DataSuccess, code_table(&state, TAX_STATUSES).await)
}

async fn code_table(state: &AppState, table: &str) -> ApiResult<Value> {
    let rows = state
        .public
        .reference_table(table, &["code", "description"], Some(OrderBy::asc("code")))
        .await?;
    Ok(Value::Array(rows))
}
