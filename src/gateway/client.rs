//! # Data Gateway Trait
//!
//! The seam between route handlers and the hosted database. Implementations:
//! [`HttpGateway`](super::HttpGateway) for the real service and
//! [`MemoryGateway`](super::MemoryGateway) for tests and demo mode.

use async_trait::async_trait;
use serde_json::Value;

use super::errors::GatewayResult;
use super::query::{CountPrecision, TableQuery};

/// Remote data gateway operations
///
/// Every call is a single attempt. Failures come back as values.
#[async_trait]
pub trait DataGateway: Send + Sync + 'static {
    /// Short backend name for logs
    fn backend_tag(&self) -> &'static str;

    /// Invoke a named remote procedure with a JSON object of arguments
    async fn call(&self, procedure: &str, args: Value) -> GatewayResult<Value>;

    /// Read rows from a table
    async fn select(&self, query: &TableQuery) -> GatewayResult<Vec<Value>>;

    /// Count rows matching the query's filters; range and ordering are ignored
    async fn count(&self, query: &TableQuery, precision: CountPrecision) -> GatewayResult<u64>;
}

/// Procedure and table names are plain identifiers
pub(crate) fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}
