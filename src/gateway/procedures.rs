//! Stored procedure names and argument shapes
//!
//! The hosted database owns the procedures; these are the contracts the API relies on.

use serde_json::{json, Value};

/// `[{ "year": i64 }]`, newest first
pub const DISTINCT_GUIDE_YEARS: &str = "get_distinct_guide_years";

/// `["Sedan", ...]` for `{ p_guide_year }`
pub const TYPES_BY_GUIDE_YEAR: &str = "get_types_by_guide_year";

/// `[{ "make": text }]` for `{ p_guide_year, p_type }`; a null type means every type
pub const MAKES_BY_GUIDE_YEAR_TYPE: &str = "get_makes_by_guide_year_type";

/// Vehicle guide rows for `{ p_filters }`
pub const SEARCH_VIN_GUIDE: &str = "search_vin_guide";

/// Devnet review rows for `{ p_filters }`
pub const SEARCH_DEVNET_REVIEWS: &str = "search_devnet_reviews";

pub fn guide_year_args(guide_year: i64) -> Value {
    json!({ "p_guide_year": guide_year })
}

pub fn guide_year_type_args(guide_year: i64, vehicle_type: Option<&str>) -> Value {
    json!({ "p_guide_year": guide_year, "p_type": vehicle_type })
}

pub fn filter_args(filters: Value) -> Value {
    json!({ "p_filters": filters })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_shapes() {
        assert_eq!(guide_year_args(2023), json!({"p_guide_year": 2023}));
        assert_eq!(
            guide_year_type_args(2023, None),
            json!({"p_guide_year": 2023, "p_type": null})
        );
        assert_eq!(
            filter_args(json!({"make": "Ford"})),
            json!({"p_filters": {"make": "Ford"}})
        );
    }
}
