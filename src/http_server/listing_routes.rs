//! Paginated Listing HTTP Routes
//!
//! `GET /api/{parcels,sales,appeals,wards,appraisers}` with `page`, `page_size`,
//! `order`, `count` and column filters such as `ward=in.(1,2)`. Each response carries
//! one page of rows and the count metadata.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde_json::Value;

use crate::api::{respond, ApiError, ApiResult, Envelope};
use crate::bridge::RequestParams;
use crate::gateway::{OrderBy, TableQuery};
use crate::pagination::fetch_page;

use super::state::AppState;

/// A paginated table exposed under `/api`
#[derive(Debug, Clone, Copy)]
pub struct Listing {
    pub path: &'static str,
    pub table: &'static str,
    /// Columns callers may filter and order by
    pub columns: &'static [&'static str],
    pub default_order: &'static str,
    pub default_ascending: bool,
}

pub const LISTINGS: &[Listing] = &[
    Listing {
        path: "/parcels",
        table: "parcels",
        columns: &["parcel_id", "nbhd", "ward", "occupancy", "owner", "assessed_value"],
        default_order: "parcel_id",
        default_ascending: true,
    },
    Listing {
        path: "/sales",
        table: "sales",
        columns: &["sale_id", "parcel_id", "sale_date", "sale_price", "nbhd"],
        default_order: "sale_date",
        default_ascending: false,
    },
    Listing {
        path: "/appeals",
        table: "appeals",
        columns: &["appeal_id", "parcel_id", "tax_year", "status"],
        default_order: "appeal_id",
        default_ascending: true,
    },
    Listing {
        path: "/wards",
        table: "wards",
        columns: &["ward", "name"],
        default_order: "ward",
        default_ascending: true,
    },
    Listing {
        path: "/appraisers",
        table: "appraisers",
        columns: &["appraiser_id", "name", "ward"],
        default_order: "name",
        default_ascending: true,
    },
];

/// Create one paginated route per listing
pub fn listing_routes(state: Arc<AppState>) -> Router {
    LISTINGS
        .iter()
        .fold(Router::<Arc<AppState>>::new(), |router, listing| {
            let listing = *listing;
            router.route(
                listing.path,
                get(
                    move |State(state): State<Arc<AppState>>,
                          Query(query): Query<HashMap<String, String>>| async move {
                        list_handler(listing, state, query).await
                    },
                ),
            )
        })
        .with_state(state)
}

// The page already carries `data` next to its metadata
async fn list_handler(
    listing: Listing,
    state: Arc<AppState>,
    query: HashMap<String, String>,
) -> Response {
    respond(
        Envelope::Bare,
        list_page(&listing, &state, RequestParams::from(query)).await,
    )
}

async fn list_page(listing: &Listing, state: &AppState, params: RequestParams) -> ApiResult<Value> {
    let page = params.page_request()?;
    let precision = params.count_precision()?;
    let filters = params.table_filters(listing.columns)?;
    let mut order = params.order(listing.columns)?;
    if order.is_empty() {
        order.push(OrderBy {
            field: listing.default_order.to_string(),
            ascending: listing.default_ascending,
        });
    }

    let mut query = TableQuery::new(listing.table).filters(filters);
    query.order = order;

    let result = fetch_page(&state.session, &query, page, precision).await?;
    serde_json::to_value(result).map_err(|e| ApiError::unexpected(e.to_string()))
}
