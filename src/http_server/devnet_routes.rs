//! Devnet HTTP Routes
//!
//! Employee directory (public reference data) and review records. Reviews may carry
//! parcel and owner detail, so both review routes use the session tier.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::Value;

use crate::api::{respond, rows_or_empty, ApiResult, Envelope};
use crate::bridge::RequestParams;
use crate::gateway::procedures::{filter_args, SEARCH_DEVNET_REVIEWS};
use crate::gateway::{OrderBy, TableQuery};

use super::state::AppState;

pub const DEVNET_EMPLOYEES: &str = "devnet_employees";
pub const DEVNET_REVIEWS: &str = "devnet_reviews";

/// Create devnet routes
pub fn devnet_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/devnet-employees", get(employees_handler))
        .route("/devnet-reviews", get(reviews_handler))
        .route("/devnet-review-search", get(review_search_handler))
        .with_state(state)
}

async fn employees_handler(State(state): State<Arc<AppState>>) -> Response {
    respond(Envelope::Bare, employees(&state).await)
}

async fn reviews_handler(State(state): State<Arc<AppState>>) -> Response {
    respond(Envelope::DataSuccess, reviews(&state).await)
}

async fn review_search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(
        Envelope::DataSuccess,
        review_search(&state, RequestParams::from(query)).await,
    )
}

async fn employees(state: &AppState) -> ApiResult<Value> {
    let rows = state
        .public
        .reference_table(DEVNET_EMPLOYEES, &[], Some(OrderBy::asc("name")))
        .await?;
    Ok(Value::Array(rows))
}

async fn reviews(state: &AppState) -> ApiResult<Value> {
    let query = TableQuery::new(DEVNET_REVIEWS).order_by(OrderBy::desc("review_id"));
    let rows = state.session.select(&query).await?;
    Ok(Value::Array(rows))
}

async fn review_search(state: &AppState, params: RequestParams) -> ApiResult<Value> {
    let filters = params.filter_blob("p_filters")?;
    let rows = state
        .session
        .call(SEARCH_DEVNET_REVIEWS, filter_args(filters))
        .await?;
    Ok(rows_or_empty(rows))
}
