//! Vehicle Guide HTTP Routes
//!
//! Cascading lookups (guide year → type → make) and VIN guide search. All of them call
//! stored procedures, so all use the session tier.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::api::{respond, rows_or_empty, ApiResult, Envelope};
use crate::bridge::RequestParams;
use crate::gateway::procedures::{
    filter_args, guide_year_args, guide_year_type_args, DISTINCT_GUIDE_YEARS,
    MAKES_BY_GUIDE_YEAR_TYPE, SEARCH_VIN_GUIDE, TYPES_BY_GUIDE_YEAR,
};

use super::state::AppState;

/// Create vehicle guide routes
pub fn vehicle_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/guide-years", get(guide_years_handler))
        .route("/types-by-guide-year", get(types_by_guide_year_handler))
        .route("/makes-by-guide-year-type", get(makes_by_guide_year_type_handler))
        .route("/vin-guide-search", get(vin_guide_search_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

/// `[{ "year": 2023 }, ...]`
async fn guide_years_handler(State(state): State<Arc<AppState>>) -> Response {
    respond(Envelope::Bare, guide_years(&state).await)
}

/// `{ "data": ["Sedan", ...] }`
async fn types_by_guide_year_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(
        Envelope::Data,
        types_by_guide_year(&state, RequestParams::from(query)).await,
    )
}

/// `[{ "make": "Ford" }, ...]`
async fn makes_by_guide_year_type_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(
        Envelope::Bare,
        makes_by_guide_year_type(&state, RequestParams::from(query)).await,
    )
}

/// `{ "data": [...], "success": true }`
async fn vin_guide_search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    respond(
        Envelope::DataSuccess,
        vin_guide_search(&state, RequestParams::from(query)).await,
    )
}

// ==================
// Operations
// ==================

async fn guide_years(state: &AppState) -> ApiResult<Value> {
    let rows = state.session.call(DISTINCT_GUIDE_YEARS, json!({})).await?;
    Ok(rows_or_empty(rows))
}

async fn types_by_guide_year(state: &AppState, params: RequestParams) -> ApiResult<Value> {
    let guide_year = params.require_int("guide_year")?;
    let rows = state
        .session
        .call(TYPES_BY_GUIDE_YEAR, guide_year_args(guide_year))
        .await?;
    Ok(rows_or_empty(rows))
}

async fn makes_by_guide_year_type(state: &AppState, params: RequestParams) -> ApiResult<Value> {
    let guide_year = params.require_int("guide_year")?;
    let vehicle_type = params.optional_text("type");
    let rows = state
        .session
        .call(
            MAKES_BY_GUIDE_YEAR_TYPE,
            guide_year_type_args(guide_year, vehicle_type.as_deref()),
        )
        .await?;
    Ok(rows_or_empty(rows))
}

async fn vin_guide_search(state: &AppState, params: RequestParams) -> ApiResult<Value> {
    let filters = params.filter_blob("p_filters")?;
    let rows = state
        .session
        .call(SEARCH_VIN_GUIDE, filter_args(filters))
        .await?;
    Ok(rows_or_empty(rows))
}
