//! API Route Tests
//!
//! Drives the full router (CORS, request logging, panic catching) against in-process
//! gateways:
//! - validation failures return 400 before any gateway call
//! - each route keeps its declared envelope
//! - gateway failures return 500 with only an `error` field
//! - reference tables use the public tier, everything else the session tier

use std::sync::Arc;

use assessor_admin::gateway::demo::demo_gateway;
use assessor_admin::gateway::{GatewayCall, GatewayError, MemoryGateway};
use assessor_admin::http_server::{AppState, HttpServer, HttpServerConfig};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

fn app(memory: Arc<MemoryGateway>) -> Router {
    HttpServer::new(HttpServerConfig::default(), AppState::single(memory)).router()
}

fn demo() -> (Arc<MemoryGateway>, Router) {
    let memory = Arc::new(demo_gateway().with_recording());
    let router = app(memory.clone());
    (memory, router)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_missing_guide_year_is_rejected_before_gateway() {
    let (memory, router) = demo();

    let (status, body) = get(&router, "/api/types-by-guide-year").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "guide_year parameter is required"}));
    assert_eq!(memory.call_count(), 0);
}

#[tokio::test]
async fn test_non_integer_guide_year_is_rejected() {
    let (memory, router) = demo();

    let (status, body) = get(&router, "/api/makes-by-guide-year-type?guide_year=twenty").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "guide_year must be an integer"}));
    assert_eq!(memory.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_filter_blob_is_rejected() {
    let (memory, router) = demo();

    let (status, body) = get(&router, "/api/vin-guide-search?p_filters=%7Bmake").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "p_filters must be valid JSON"}));
    assert_eq!(memory.call_count(), 0);
}

// =============================================================================
// Vehicle Guide
// =============================================================================

#[tokio::test]
async fn test_types_by_guide_year_uses_data_envelope() {
    let (memory, router) = demo();

    let (status, body) = get(&router, "/api/types-by-guide-year?guide_year=2023").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": ["Sedan", "Truck"]}));
    assert_eq!(
        memory.calls(),
        vec![GatewayCall::Procedure {
            name: "get_types_by_guide_year".to_string(),
            args: json!({"p_guide_year": 2023}),
        }]
    );
}

#[tokio::test]
async fn test_guide_years_bare_list() {
    let (_memory, router) = demo();

    let (status, body) = get(&router, "/api/guide-years").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"year": 2023}, {"year": 2022}, {"year": 2021}]));
}

#[tokio::test]
async fn test_makes_with_and_without_type() {
    let (memory, router) = demo();

    let (status, body) = get(
        &router,
        "/api/makes-by-guide-year-type?guide_year=2023&type=Sedan",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"make": "Honda"}, {"make": "Toyota"}]));

    let (status, body) = get(&router, "/api/makes-by-guide-year-type?guide_year=2022").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"make": "Honda"}, {"make": "Subaru"}]));

    let last = memory.calls().pop().unwrap();
    assert_eq!(
        last,
        GatewayCall::Procedure {
            name: "get_makes_by_guide_year_type".to_string(),
            args: json!({"p_guide_year": 2022, "p_type": null}),
        }
    );
}

#[tokio::test]
async fn test_vin_search_defaults_to_empty_filters() {
    let (memory, router) = demo();

    let (status, body) = get(&router, "/api/vin-guide-search").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"].as_array().unwrap().len(), 7);
    assert_eq!(
        memory.calls(),
        vec![GatewayCall::Procedure {
            name: "search_vin_guide".to_string(),
            args: json!({"p_filters": {}}),
        }]
    );
}

#[tokio::test]
async fn test_vin_search_forwards_filters() {
    let (_memory, router) = demo();

    // {"make":"Ford"}
    let (status, body) = get(
        &router,
        "/api/vin-guide-search?p_filters=%7B%22make%22%3A%22Ford%22%7D",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["vin"], json!("1FTFW1E50PF000003"));
}

#[tokio::test]
async fn test_empty_procedure_result_is_empty_list() {
    let memory = Arc::new(
        MemoryGateway::new().with_fixed_procedure("get_types_by_guide_year", Value::Null),
    );
    let router = app(memory);

    let (status, body) = get(&router, "/api/types-by-guide-year?guide_year=1990").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": []}));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_gateway_failure_returns_500_with_message() {
    let (memory, router) = demo();
    memory.fail(
        "get_types_by_guide_year",
        GatewayError::remote(500, "canceling statement due to statement timeout"),
    );

    let (status, body) = get(&router, "/api/types-by-guide-year?guide_year=2023").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "canceling statement due to statement timeout"})
    );
}

#[tokio::test]
async fn test_transport_failure_on_data_success_route() {
    let (memory, router) = demo();
    memory.fail(
        "search_devnet_reviews",
        GatewayError::Transport("connection reset".into()),
    );

    let (status, body) = get(&router, "/api/devnet-review-search").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("data").is_none());
    assert!(body.get("success").is_none());
    assert!(body["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_handler_panic_returns_generic_500() {
    let memory = Arc::new(MemoryGateway::new().with_procedure(
        "get_distinct_guide_years",
        |_| -> Result<Value, GatewayError> { panic!("procedure handler exploded") },
    ));
    let router = app(memory);

    let (status, body) = get(&router, "/api/guide-years").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));

    let (_, metrics) = get(&router, "/observability/metrics").await;
    assert_eq!(metrics["handler_panics"], json!(1));
}

// =============================================================================
// Reference Tables and Devnet
// =============================================================================

#[tokio::test]
async fn test_reference_table_envelopes() {
    let (_memory, router) = demo();

    let (status, body) = get(&router, "/api/land-use-codes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0], json!({"code": "100", "description": "Residential"}));

    let (status, body) = get(&router, "/api/tax-statuses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"][0]["code"], json!("E"));
}

#[tokio::test]
async fn test_devnet_routes() {
    let (_memory, router) = demo();

    let (status, body) = get(&router, "/api/devnet-employees").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], json!("M. Chen"));

    let (status, body) = get(&router, "/api/devnet-reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["review_id"], json!(3));

    // {"status":"closed"}
    let (status, body) = get(
        &router,
        "/api/devnet-review-search?p_filters=%7B%22status%22%3A%22closed%22%7D",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_credential_tiers_are_separate() {
    let public = Arc::new(demo_gateway().with_recording());
    let session = Arc::new(demo_gateway().with_recording());
    let state = AppState::new(public.clone(), session.clone());
    let router = HttpServer::new(HttpServerConfig::default(), state).router();

    get(&router, "/api/land-use-codes").await;
    get(&router, "/api/devnet-employees").await;
    assert_eq!(public.call_count(), 2);
    assert_eq!(session.call_count(), 0);

    get(&router, "/api/vin-guide-search").await;
    get(&router, "/api/devnet-reviews").await;
    get(&router, "/api/parcels").await;
    assert_eq!(public.call_count(), 2);
    assert_eq!(session.call_count(), 4);
}

// =============================================================================
// Paginated Listings
// =============================================================================

#[tokio::test]
async fn test_listing_page_metadata() {
    let (_memory, router) = demo();

    let (status, body) = get(&router, "/api/parcels?page=2&page_size=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], json!(3));
    assert_eq!(body["total_pages"], json!(2));
    assert_eq!(body["page"], json!(2));
    assert_eq!(body["page_size"], json!(2));
    assert_eq!(body["count_precision"], json!("exact"));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["parcel_id"], json!("02-0310-017"));
}

#[tokio::test]
async fn test_listing_filters_and_order() {
    let (_memory, router) = demo();

    let (status, body) = get(&router, "/api/parcels?ward=eq.1&order=assessed_value.desc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], json!(2));
    assert_eq!(body["data"][0]["owner"], json!("Johnson"));
    assert_eq!(body["data"][1]["owner"], json!("Wilson"));
}

#[tokio::test]
async fn test_listing_rejects_unknown_filter() {
    let (memory, router) = demo();

    let (status, body) = get(&router, "/api/sales?buyer_ssn=eq.1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "unknown filter: buyer_ssn"}));
    assert_eq!(memory.call_count(), 0);
}

#[tokio::test]
async fn test_listing_rejects_page_past_addressable_range() {
    let (memory, router) = demo();

    let uri = format!("/api/parcels?page={}&page_size=2", usize::MAX);
    let (status, body) = get(&router, &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "page is out of range"}));
    assert_eq!(memory.call_count(), 0);
}

#[tokio::test]
async fn test_listing_count_failure_returns_no_rows() {
    let (memory, router) = demo();
    memory.fail_count("appeals", GatewayError::remote(500, "count failed"));

    let (status, body) = get(&router, "/api/appeals").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "count failed"}));
}

#[tokio::test]
async fn test_empty_listing_has_zero_pages() {
    let memory = Arc::new(MemoryGateway::new().with_table("wards", vec![]));
    let router = app(memory);

    let (status, body) = get(&router, "/api/wards").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], json!(0));
    assert_eq!(body["total_pages"], json!(0));
    assert_eq!(body["data"], json!([]));
}

// =============================================================================
// Health and Metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (_memory, router) = demo();

    let (status, body) = get(&router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_metrics_count_requests_and_rejections() {
    let (memory, router) = demo();
    memory.fail("search_vin_guide", GatewayError::remote(500, "down"));

    get(&router, "/api/guide-years").await;
    get(&router, "/api/types-by-guide-year").await;
    get(&router, "/api/vin-guide-search").await;

    let (status, metrics) = get(&router, "/observability/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["requests_total"], json!(3));
    assert_eq!(metrics["requests_failed"], json!(2));
    assert_eq!(metrics["validation_rejects"], json!(1));
    assert_eq!(metrics["gateway_calls"], json!(2));
    assert_eq!(metrics["gateway_failures"], json!(1));
}
