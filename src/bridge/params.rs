//! # Request Parameters
//!
//! Typed access to query-string parameters. Every accessor that can fail returns an
//! [`ApiError::Validation`], and handlers run all of them before touching a gateway.

use std::collections::HashMap;

use serde_json::{json, Number, Value};

use crate::api::{ApiError, ApiResult};
use crate::gateway::{CountPrecision, FilterExpr, FilterOperator, OrderBy};
use crate::pagination::{PageRequest, DEFAULT_PAGE_SIZE};

/// Parameters consumed by pagination and ordering, never treated as filters
const RESERVED_KEYS: &[&str] = &["page", "page_size", "order", "count"];

/// Raw query-string parameters of one request
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    raw: HashMap<String, String>,
}

impl From<HashMap<String, String>> for RequestParams {
    fn from(raw: HashMap<String, String>) -> Self {
        Self { raw }
    }
}

impl RequestParams {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            raw: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Trimmed value; empty counts as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_int(&self, key: &str) -> ApiResult<i64> {
        let value = self
            .get(key)
            .ok_or_else(|| ApiError::validation(format!("{key} parameter is required")))?;
        value
            .parse()
            .map_err(|_| ApiError::validation(format!("{key} must be an integer")))
    }

    pub fn optional_text(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Parse a JSON-encoded parameter if present
    pub fn optional_json(&self, key: &str) -> ApiResult<Option<Value>> {
        self.get(key)
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|_| ApiError::validation(format!("{key} must be valid JSON")))
            })
            .transpose()
    }

    pub fn require_json(&self, key: &str) -> ApiResult<Value> {
        self.optional_json(key)?
            .ok_or_else(|| ApiError::validation(format!("{key} parameter is required")))
    }

    /// A search filter blob, forwarded as is; absent means no filters
    pub fn filter_blob(&self, key: &str) -> ApiResult<Value> {
        Ok(self.optional_json(key)?.unwrap_or_else(|| json!({})))
    }

    /// `page` (default 1) and `page_size` (default 25)
    pub fn page_request(&self) -> ApiResult<PageRequest> {
        let page = self.positive("page", 1)?;
        let page_size = self.positive("page_size", DEFAULT_PAGE_SIZE)?;
        PageRequest::new(page, page_size).map_err(|err| ApiError::validation(err.to_string()))
    }

    /// `count` precision, exact unless asked otherwise
    pub fn count_precision(&self) -> ApiResult<CountPrecision> {
        match self.get("count") {
            None | Some("exact") => Ok(CountPrecision::Exact),
            Some("planned") => Ok(CountPrecision::Planned),
            Some("estimated") => Ok(CountPrecision::Estimated),
            Some(other) => Err(ApiError::validation(format!(
                "count must be exact, planned or estimated, got {other}"
            ))),
        }
    }

    /// `order=col.asc,col2.desc` restricted to `allowed` columns
    pub fn order(&self, allowed: &[&str]) -> ApiResult<Vec<OrderBy>> {
        let Some(value) = self.get("order") else {
            return Ok(Vec::new());
        };
        let orders = parse_order(value)?;
        if let Some(bad) = orders.iter().find(|o| !allowed.contains(&o.field.as_str())) {
            return Err(ApiError::validation(format!(
                "cannot order by {}",
                bad.field
            )));
        }
        Ok(orders)
    }

    /// Every non-reserved parameter as a column filter; keys outside `allowed` are rejected
    pub fn table_filters(&self, allowed: &[&str]) -> ApiResult<Vec<FilterExpr>> {
        let mut keys: Vec<&String> = self
            .raw
            .keys()
            .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
            .collect();
        keys.sort();

        let mut filters = Vec::with_capacity(keys.len());
        for key in keys {
            if !allowed.contains(&key.as_str()) {
                return Err(ApiError::validation(format!("unknown filter: {key}")));
            }
            if let Some(value) = self.get(key) {
                filters.push(parse_filter(key, value)?);
            }
        }
        Ok(filters)
    }

    fn positive(&self, key: &str, default: usize) -> ApiResult<usize> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::validation(format!("{key} must be a positive integer"))),
        }
    }
}

/// Parse `field.direction` pairs; a bare field is ascending
fn parse_order(value: &str) -> ApiResult<Vec<OrderBy>> {
    let mut orders = Vec::new();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let order = match part.rsplit_once('.') {
            Some((field, direction)) => match direction.to_lowercase().as_str() {
                "asc" => OrderBy::asc(field),
                "desc" => OrderBy::desc(field),
                _ => {
                    return Err(ApiError::validation(format!(
                        "invalid order direction: {direction}"
                    )))
                }
            },
            None => OrderBy::asc(part),
        };
        orders.push(order);
    }

    Ok(orders)
}

/// Parse `op.value`; an unknown or missing operator means equality with the whole value
fn parse_filter(field: &str, value: &str) -> ApiResult<FilterExpr> {
    let (operator, operand) = match value.split_once('.') {
        Some((op, rest)) => match FilterOperator::parse(op) {
            Some(op) => (op, rest),
            None => (FilterOperator::Eq, value),
        },
        None => (FilterOperator::Eq, value),
    };

    let operand = parse_filter_value(operand);
    if operator == FilterOperator::In && !operand.is_array() {
        return Err(ApiError::validation(format!(
            "{field}: in filter expects a list like in.(a,b)"
        )));
    }
    if operator == FilterOperator::Is && !matches!(operand, Value::Null | Value::Bool(_)) {
        return Err(ApiError::validation(format!(
            "{field}: is filter expects null, true or false"
        )));
    }

    Ok(FilterExpr::new(field, operator, operand))
}

/// Lists `(a,b)`, null, booleans and numbers; anything else is text
fn parse_filter_value(value: &str) -> Value {
    if let Some(inner) = value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Value::Array(
            inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_filter_value)
                .collect(),
        );
    }

    match value {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }

    Value::String(value.to_string())
}
