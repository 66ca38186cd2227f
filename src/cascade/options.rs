//! Filter values and option lists

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::gateway::loosely_equal;

/// A single filter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Scalars from JSON; arrays, objects and null have no scalar form
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Number)),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Number((*i).into()),
            Scalar::Number(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Scalar::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality across representations, so `"2023"` matches `2023`
    pub fn same_as(&self, other: &Scalar) -> bool {
        loosely_equal(&self.to_json(), &other.to_json())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// A filter's value: one scalar or a multi-select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl FilterValue {
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::One(s) => s.to_json(),
            FilterValue::Many(items) => Value::Array(items.iter().map(Scalar::to_json).collect()),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FilterValue::One(s) => Some(s),
            FilterValue::Many(_) => None,
        }
    }
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::One(value)
    }
}

/// Filter key to value, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet(BTreeMap<String, FilterValue>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    /// The value under `key` if it is a single scalar
    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(FilterValue::as_scalar)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    /// JSON object form, as sent in `p_filters`
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Stable key for caching lookups scoped by this set
    pub fn cache_key(&self) -> String {
        self.to_json().to_string()
    }
}

/// Distinct values offered for one filter, in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionList {
    values: Vec<Scalar>,
}

impl OptionList {
    pub fn new(values: impl IntoIterator<Item = Scalar>) -> Self {
        let mut list = Self::default();
        for value in values {
            list.push(value);
        }
        list
    }

    /// Build from lookup rows. A scalar row is taken as is. An object row contributes
    /// `column`, or its only field when no column is named.
    pub fn from_rows(rows: &[Value], column: Option<&str>) -> Self {
        let scalars = rows.iter().filter_map(|row| match row {
            Value::Object(fields) => {
                let value = match column {
                    Some(column) => fields.get(column),
                    None if fields.len() == 1 => fields.values().next(),
                    None => None,
                };
                value.and_then(Scalar::from_json)
            }
            other => Scalar::from_json(other),
        });
        Self::new(scalars)
    }

    fn push(&mut self, value: Scalar) {
        if !self.contains(&value) {
            self.values.push(value);
        }
    }

    pub fn contains(&self, value: &Scalar) -> bool {
        self.values.iter().any(|v| v.same_as(value))
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
