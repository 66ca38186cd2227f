//! # Table Query Model
//!
//! Column projection, filters, ordering and range for direct table reads. Queries render
//! to PostgREST query pairs for the HTTP gateway and evaluate in-process for the memory
//! gateway.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equals
    Eq,
    /// Not equals
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Pattern match, case sensitive (`%` and `_` wildcards)
    Like,
    /// Pattern match, case insensitive
    Ilike,
    /// Value in list
    In,
    /// Is null / not null
    Is,
}

impl FilterOperator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::Ilike => "ilike",
            FilterOperator::In => "in",
            FilterOperator::Is => "is",
        }
    }

    /// Parse an operator prefix such as `gte`
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" => FilterOperator::Eq,
            "neq" => FilterOperator::Neq,
            "gt" => FilterOperator::Gt,
            "gte" => FilterOperator::Gte,
            "lt" => FilterOperator::Lt,
            "lte" => FilterOperator::Lte,
            "like" => FilterOperator::Like,
            "ilike" => FilterOperator::Ilike,
            "in" => FilterOperator::In,
            "is" => FilterOperator::Is,
            _ => return None,
        })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter expression on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create an inclusive range pair (`gte` lower, `lte` upper)
    pub fn between(field: impl Into<String> + Clone, low: Value, high: Value) -> [Self; 2] {
        [
            Self::new(field.clone(), FilterOperator::Gte, low),
            Self::new(field, FilterOperator::Lte, high),
        ]
    }

    /// Create an "in list" filter
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Render the right-hand side of a PostgREST filter pair, e.g. `gte.2020`
    pub fn to_query_value(&self) -> String {
        let rendered = match (&self.operator, &self.value) {
            (FilterOperator::In, Value::Array(items)) => {
                let parts: Vec<String> = items.iter().map(render_list_item).collect();
                format!("({})", parts.join(","))
            }
            (_, value) => render_scalar(value),
        };
        format!("{}.{}", self.operator.as_str(), rendered)
    }

    /// Check if a row matches this filter
    pub fn matches(&self, row: &Value) -> bool {
        let field_value = match row.get(&self.field) {
            Some(v) => v,
            None => return self.operator == FilterOperator::Is && self.value.is_null(),
        };

        match self.operator {
            FilterOperator::Eq => loosely_equal(field_value, &self.value),
            FilterOperator::Neq => !loosely_equal(field_value, &self.value),
            FilterOperator::Gt => compare_json_values(field_value, &self.value) == Ordering::Greater,
            FilterOperator::Gte => compare_json_values(field_value, &self.value) != Ordering::Less,
            FilterOperator::Lt => compare_json_values(field_value, &self.value) == Ordering::Less,
            FilterOperator::Lte => {
                compare_json_values(field_value, &self.value) != Ordering::Greater
            }
            FilterOperator::Like | FilterOperator::Ilike => {
                match (field_value.as_str(), self.value.as_str()) {
                    (Some(text), Some(pattern)) if self.operator == FilterOperator::Ilike => {
                        like_match(&text.to_lowercase(), &pattern.to_lowercase())
                    }
                    (Some(text), Some(pattern)) => like_match(text, pattern),
                    _ => false,
                }
            }
            FilterOperator::In => match self.value.as_array() {
                Some(items) => items.iter().any(|item| loosely_equal(field_value, item)),
                None => false,
            },
            FilterOperator::Is => {
                if self.value.is_null() {
                    field_value.is_null()
                } else {
                    !field_value.is_null()
                }
            }
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// List items with reserved characters are double-quoted
fn render_list_item(value: &Value) -> String {
    let raw = render_scalar(value);
    if raw.contains([',', '(', ')', '"']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}

// Query-string values arrive as text, so `"2023"` must equal `2023`
pub(crate) fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.parse::<f64>()) {
                (Some(x), Ok(y)) => x == y,
                _ => false,
            }
        }
        (Value::Bool(flag), Value::String(s)) | (Value::String(s), Value::Bool(flag)) => {
            s.parse::<bool>().map(|parsed| parsed == *flag).unwrap_or(false)
        }
        _ => false,
    }
}

/// Compare two JSON values for ordering
pub(crate) fn compare_json_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Number(n), Value::String(s)) => match (n.as_f64(), s.parse::<f64>()) {
            (Some(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Value::String(s), Value::Number(n)) => match (s.parse::<f64>(), n.as_f64()) {
            (Ok(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        // nulls sort last
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// SQL LIKE matching: `%` any sequence, `_` single char
// `%` matches any run, `_` one character; iterative with a single backtrack point
fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                star = Some((p, v));
                p += 1;
            }
            Some('_') => {
                v += 1;
                p += 1;
            }
            Some(c) if *c == value[v] => {
                v += 1;
                p += 1;
            }
            _ => match star {
                Some((star_p, star_v)) => {
                    p = star_p + 1;
                    v = star_v + 1;
                    star = Some((star_p, star_v + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

/// Order by clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    fn render(&self) -> String {
        format!(
            "{}.{}",
            self.field,
            if self.ascending { "asc" } else { "desc" }
        )
    }
}

/// Precision of a row count
///
/// `Planned` and `Estimated` come from planner statistics and may be off; callers must
/// not treat them as exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountPrecision {
    #[default]
    Exact,
    Planned,
    Estimated,
}

impl CountPrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountPrecision::Exact => "exact",
            CountPrecision::Planned => "planned",
            CountPrecision::Estimated => "estimated",
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, CountPrecision::Exact)
    }
}

/// A direct table read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableQuery {
    pub table: String,
    /// Projected columns; empty means all
    pub select: Vec<String>,
    pub filters: Vec<FilterExpr>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = FilterExpr>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn range(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// The same query without projection, ordering or range, for counting
    pub fn without_pagination(&self) -> Self {
        Self {
            table: self.table.clone(),
            select: Vec::new(),
            filters: self.filters.clone(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Render as PostgREST query-string pairs
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 4);

        let select = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(",")
        };
        pairs.push(("select".to_string(), select));

        for filter in &self.filters {
            pairs.push((filter.field.clone(), filter.to_query_value()));
        }

        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(OrderBy::render).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }

        pairs
    }

    /// Check if a row passes every filter
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Evaluate against in-process rows: filter, order, range, then project
    pub fn evaluate(&self, rows: &[Value]) -> Vec<Value> {
        let mut matched: Vec<Value> = rows.iter().filter(|r| self.matches(r)).cloned().collect();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| {
                for order in &self.order {
                    let a_val = a.get(&order.field).unwrap_or(&Value::Null);
                    let b_val = b.get(&order.field).unwrap_or(&Value::Null);
                    let cmp = compare_json_values(a_val, b_val);
                    let cmp = if order.ascending { cmp } else { cmp.reverse() };
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(usize::MAX);
        let window = matched.into_iter().skip(offset).take(limit);

        if self.select.is_empty() || self.select.iter().any(|c| c == "*") {
            return window.collect();
        }

        window
            .map(|row| match row {
                Value::Object(obj) => Value::Object(
                    obj.into_iter()
                        .filter(|(k, _)| self.select.contains(k))
                        .collect(),
                ),
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter_accepts_numeric_text() {
        let filter = FilterExpr::eq("guide_year", json!("2023"));

        assert!(filter.matches(&json!({"guide_year": 2023})));
        assert!(!filter.matches(&json!({"guide_year": 2022})));
    }

    #[test]
    fn test_range_filters() {
        let [low, high] = FilterExpr::between("sale_price", json!(100000), json!(250000));
        let query = TableQuery::new("sales").filter(low).filter(high);

        assert!(query.matches(&json!({"sale_price": 100000})));
        assert!(query.matches(&json!({"sale_price": 250000})));
        assert!(!query.matches(&json!({"sale_price": 99999})));
    }

    #[test]
    fn test_in_filter() {
        let filter = FilterExpr::in_list("occupancy", vec![json!("SFR"), json!("CONDO")]);

        assert!(filter.matches(&json!({"occupancy": "SFR"})));
        assert!(!filter.matches(&json!({"occupancy": "DUPLEX"})));
    }

    #[test]
    fn test_like_and_ilike() {
        let like = FilterExpr::new("owner", FilterOperator::Like, json!("%son"));
        assert!(like.matches(&json!({"owner": "Johnson"})));
        assert!(!like.matches(&json!({"owner": "JOHNSON"})));

        let ilike = FilterExpr::new("owner", FilterOperator::Ilike, json!("%SON"));
        assert!(ilike.matches(&json!({"owner": "Johnson"})));

        let single = FilterExpr::new("ward", FilterOperator::Like, json!("W_"));
        assert!(single.matches(&json!({"ward": "W1"})));
        assert!(!single.matches(&json!({"ward": "W10"})));
    }

    #[test]
    fn test_like_many_wildcards_on_long_text() {
        let owner = "a".repeat(5000);
        let row = json!({ "owner": owner });

        let miss = FilterExpr::new("owner", FilterOperator::Like, json!("%a%a%a%a%a%a%b"));
        assert!(!miss.matches(&row));

        let hit = FilterExpr::new("owner", FilterOperator::Like, json!("%a%a%a%a%a%a%"));
        assert!(hit.matches(&row));

        assert!(like_match("Johnson", "J%n%n"));
        assert!(like_match("", "%%"));
        assert!(!like_match("abc", "a_"));
        assert!(like_match("abc", "_%c"));
    }

    #[test]
    fn test_is_null() {
        let filter = FilterExpr::new("closed_at", FilterOperator::Is, Value::Null);
        assert!(filter.matches(&json!({"closed_at": null})));
        assert!(filter.matches(&json!({})));
        assert!(!filter.matches(&json!({"closed_at": "2024-01-01"})));
    }

    #[test]
    fn test_query_pairs_rendering() {
        let query = TableQuery::new("parcels")
            .columns(["parcel_id", "nbhd"])
            .filter(FilterExpr::eq("nbhd", json!("0142")))
            .filter(FilterExpr::in_list("occupancy", vec![json!("SFR"), json!("a,b")]))
            .order_by(OrderBy::desc("parcel_id"))
            .range(25, 50);

        let pairs = query.to_query_pairs();
        assert_eq!(pairs[0], ("select".to_string(), "parcel_id,nbhd".to_string()));
        assert_eq!(pairs[1], ("nbhd".to_string(), "eq.0142".to_string()));
        assert_eq!(
            pairs[2],
            ("occupancy".to_string(), "in.(SFR,\"a,b\")".to_string())
        );
        assert_eq!(pairs[3], ("order".to_string(), "parcel_id.desc".to_string()));
        assert_eq!(pairs[4], ("limit".to_string(), "25".to_string()));
        assert_eq!(pairs[5], ("offset".to_string(), "50".to_string()));
    }

    #[test]
    fn test_without_pagination_keeps_filters_only() {
        let query = TableQuery::new("sales")
            .columns(["id"])
            .filter(FilterExpr::eq("ward", json!(3)))
            .order_by(OrderBy::asc("id"))
            .range(10, 20);

        let count_query = query.without_pagination();
        assert_eq!(count_query.filters, query.filters);
        assert!(count_query.select.is_empty());
        assert!(count_query.order.is_empty());
        assert_eq!(count_query.limit, None);
        assert_eq!(count_query.offset, None);
    }

    #[test]
    fn test_evaluate_orders_pages_and_projects() {
        let rows = vec![
            json!({"id": 3, "ward": "B"}),
            json!({"id": 1, "ward": "A"}),
            json!({"id": 2, "ward": "A"}),
            json!({"id": 4, "ward": "A"}),
        ];
        let query = TableQuery::new("parcels")
            .columns(["id"])
            .filter(FilterExpr::eq("ward", json!("A")))
            .order_by(OrderBy::asc("id"))
            .range(2, 1);

        let result = query.evaluate(&rows);
        assert_eq!(result, vec![json!({"id": 2}), json!({"id": 4})]);
    }

    #[test]
    fn test_count_precision_serde() {
        assert_eq!(
            serde_json::to_value(CountPrecision::Estimated).unwrap(),
            json!("estimated")
        );
        assert!(CountPrecision::default().is_exact());
    }
}
