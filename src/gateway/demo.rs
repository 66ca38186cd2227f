//! Seed data for `serve --memory`
//!
//! A small county dataset and procedure handlers that behave like the hosted stored
//! procedures, so the API can be exercised without credentials.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use super::errors::{GatewayError, GatewayResult};
use super::memory::MemoryGateway;
use super::procedures;

fn vehicle_guide() -> Vec<Value> {
    let rows = [
        (2023, "Sedan", "Honda", "1HGCV1F3XPA000001", 24500),
        (2023, "Sedan", "Toyota", "4T1C11AK5PU000002", 26100),
        (2023, "Truck", "Ford", "1FTFW1E50PF000003", 41800),
        (2023, "Truck", "Chevrolet", "1GCUYDED5PZ000004", 43950),
        (2022, "Sedan", "Honda", "1HGCV1F34NA000005", 22300),
        (2022, "SUV", "Subaru", "4S4BTANC4N3000006", 29700),
        (2021, "Truck", "Ram", "1C6SRFFT1MN000007", 36400),
    ];
    rows.iter()
        .map(|(year, kind, make, vin, value)| {
            json!({
                "guide_year": year,
                "type": kind,
                "make": make,
                "vin": vin,
                "guide_value": value,
            })
        })
        .collect()
}

fn int_arg(args: &Value, key: &str) -> GatewayResult<i64> {
    args.get(key).and_then(Value::as_i64).ok_or_else(|| {
        GatewayError::remote(400, format!("missing or invalid argument {key}"))
    })
}

fn object_arg<'a>(args: &'a Value, key: &str) -> GatewayResult<&'a Map<String, Value>> {
    match args.get(key) {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(GatewayError::remote(400, format!("{key} must be a JSON object"))),
    }
}

// Every filter key must equal the row's value; empty strings and nulls are ignored
fn rows_matching(rows: &[Value], filters: &Map<String, Value>) -> Vec<Value> {
    rows.iter()
        .filter(|row| {
            filters.iter().all(|(key, wanted)| match wanted {
                Value::Null => true,
                Value::String(s) if s.is_empty() => true,
                Value::Array(options) => row
                    .get(key)
                    .map(|v| options.contains(v))
                    .unwrap_or(false),
                other => row.get(key) == Some(other),
            })
        })
        .cloned()
        .collect()
}

fn distinct_strings<'a>(rows: impl Iterator<Item = &'a Value>, key: &str) -> Vec<String> {
    rows.filter_map(|row| row.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build a memory gateway seeded with demo data
pub fn demo_gateway() -> MemoryGateway {
    let guide = vehicle_guide();
    let reviews = vec![
        json!({"review_id": 1, "employee_id": 10, "parcel_id": "01-0142-001", "status": "open"}),
        json!({"review_id": 2, "employee_id": 11, "parcel_id": "01-0142-002", "status": "closed"}),
        json!({"review_id": 3, "employee_id": 10, "parcel_id": "02-0310-017", "status": "closed"}),
    ];

    let years_source = guide.clone();
    let types_source = guide.clone();
    let makes_source = guide.clone();
    let search_source = guide.clone();
    let review_source = reviews.clone();

    MemoryGateway::new()
        .with_table("vehicle_guide", guide)
        .with_table("devnet_reviews", reviews)
        .with_table(
            "devnet_employees",
            vec![
                json!({"employee_id": 10, "name": "R. Alvarez", "role": "appraiser"}),
                json!({"employee_id": 11, "name": "M. Chen", "role": "reviewer"}),
            ],
        )
        .with_table(
            "land_use_codes",
            vec![
                json!({"code": "100", "description": "Residential"}),
                json!({"code": "200", "description": "Commercial"}),
                json!({"code": "300", "description": "Industrial"}),
            ],
        )
        .with_table(
            "tax_statuses",
            vec![
                json!({"code": "T", "description": "Taxable"}),
                json!({"code": "E", "description": "Exempt"}),
            ],
        )
        .with_table(
            "parcels",
            vec![
                json!({"parcel_id": "01-0142-001", "nbhd": "0142", "ward": 1, "occupancy": "SFR", "owner": "Johnson", "assessed_value": 182000}),
                json!({"parcel_id": "01-0142-002", "nbhd": "0142", "ward": 1, "occupancy": "CONDO", "owner": "Wilson", "assessed_value": 121500}),
                json!({"parcel_id": "02-0310-017", "nbhd": "0310", "ward": 2, "occupancy": "SFR", "owner": "Smith", "assessed_value": 240300}),
            ],
        )
        .with_table(
            "sales",
            vec![
                json!({"sale_id": 501, "parcel_id": "01-0142-001", "sale_date": "2024-03-14", "sale_price": 195000, "nbhd": "0142"}),
                json!({"sale_id": 502, "parcel_id": "02-0310-017", "sale_date": "2024-06-02", "sale_price": 251000, "nbhd": "0310"}),
            ],
        )
        .with_table(
            "appeals",
            vec![json!({"appeal_id": 71, "parcel_id": "01-0142-002", "tax_year": 2024, "status": "pending"})],
        )
        .with_table(
            "wards",
            vec![
                json!({"ward": 1, "name": "North"}),
                json!({"ward": 2, "name": "South"}),
            ],
        )
        .with_table(
            "appraisers",
            vec![json!({"appraiser_id": 10, "name": "R. Alvarez", "ward": 1})],
        )
        .with_procedure(procedures::DISTINCT_GUIDE_YEARS, move |_| {
            let years: BTreeSet<i64> = years_source
                .iter()
                .filter_map(|row| row.get("guide_year").and_then(Value::as_i64))
                .collect();
            Ok(Value::Array(
                years.into_iter().rev().map(|year| json!({ "year": year })).collect(),
            ))
        })
        .with_procedure(procedures::TYPES_BY_GUIDE_YEAR, move |args| {
            let year = int_arg(args, "p_guide_year")?;
            let in_year = types_source
                .iter()
                .filter(|row| row.get("guide_year").and_then(Value::as_i64) == Some(year));
            Ok(json!(distinct_strings(in_year, "type")))
        })
        .with_procedure(procedures::MAKES_BY_GUIDE_YEAR_TYPE, move |args| {
            let year = int_arg(args, "p_guide_year")?;
            let kind = args.get("p_type").and_then(Value::as_str);
            let matching = makes_source.iter().filter(|row| {
                row.get("guide_year").and_then(Value::as_i64) == Some(year)
                    && kind.map_or(true, |k| row.get("type").and_then(Value::as_str) == Some(k))
            });
            let makes = distinct_strings(matching, "make");
            Ok(Value::Array(
                makes.into_iter().map(|make| json!({ "make": make })).collect(),
            ))
        })
        .with_procedure(procedures::SEARCH_VIN_GUIDE, move |args| {
            let filters = object_arg(args, "p_filters")?;
            Ok(Value::Array(rows_matching(&search_source, filters)))
        })
        .with_procedure(procedures::SEARCH_DEVNET_REVIEWS, move |args| {
            let filters = object_arg(args, "p_filters")?;
            Ok(Value::Array(rows_matching(&review_source, filters)))
        })
}
