//! # Credential Tiers
//!
//! Two capability-scoped handles over a [`DataGateway`]:
//!
//! - [`PublicGateway`] is built with the anonymous key. It can only read whole reference
//!   tables (land-use codes, tax statuses). It has no way to express filtered search.
//! - [`SessionGateway`] is built with the session key and exposes the full surface.
//!
//! A route's tier is fixed by the handle its state holds, so the privilege boundary is
//! visible in the types.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};

use super::client::DataGateway;
use super::errors::GatewayResult;
use super::query::{CountPrecision, OrderBy, TableQuery};

/// Shared instrumentation for both tiers
#[derive(Clone)]
struct Instrumented {
    inner: Arc<dyn DataGateway>,
    tier: &'static str,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Instrumented {
    async fn observe<T, F>(&self, op: &'static str, target: &str, call: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        if let Some(metrics) = &self.metrics {
            metrics.increment_gateway_calls();
        }
        Logger::trace(
            Event::GatewayCall.as_str(),
            &[("tier", self.tier), ("op", op), ("target", target)],
        );

        let result = call.await;

        if let Err(err) = &result {
            if let Some(metrics) = &self.metrics {
                metrics.increment_gateway_failures();
            }
            let status = err.status().map(|s| s.to_string()).unwrap_or_default();
            let message = err.to_string();
            log_event_with_fields(
                Event::GatewayCallFailed,
                &[
                    ("backend", self.inner.backend_tag()),
                    ("tier", self.tier),
                    ("op", op),
                    ("target", target),
                    ("kind", err.kind()),
                    ("status", status.as_str()),
                    ("message", message.as_str()),
                ],
            );
        }

        result
    }
}

/// Anonymous-key handle: whole-table reads of public reference data only
#[derive(Clone)]
pub struct PublicGateway {
    gateway: Instrumented,
}

impl PublicGateway {
    pub fn new(inner: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway: Instrumented {
                inner,
                tier: "public",
                metrics: None,
            },
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.gateway.metrics = Some(metrics);
        self
    }

    /// Read a reference table with an optional column projection and ordering
    pub async fn reference_table(
        &self,
        table: &str,
        columns: &[&str],
        order: Option<OrderBy>,
    ) -> GatewayResult<Vec<Value>> {
        let mut query = TableQuery::new(table).columns(columns.iter().copied());
        if let Some(order) = order {
            query = query.order_by(order);
        }
        let inner = &self.gateway.inner;
        self.gateway
            .observe("select", table, inner.select(&query))
            .await
    }
}

/// Session-key handle: procedures, filtered reads and counts
#[derive(Clone)]
pub struct SessionGateway {
    gateway: Instrumented,
}

impl SessionGateway {
    pub fn new(inner: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway: Instrumented {
                inner,
                tier: "session",
                metrics: None,
            },
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.gateway.metrics = Some(metrics);
        self
    }

    /// Invoke a named remote procedure
    pub async fn call(&self, procedure: &str, args: Value) -> GatewayResult<Value> {
        let inner = &self.gateway.inner;
        self.gateway
            .observe("rpc", procedure, inner.call(procedure, args))
            .await
    }

    /// Filtered table read
    pub async fn select(&self, query: &TableQuery) -> GatewayResult<Vec<Value>> {
        let inner = &self.gateway.inner;
        self.gateway
            .observe("select", &query.table, inner.select(query))
            .await
    }

    /// Row count for the query's filters
    pub async fn count(&self, query: &TableQuery, precision: CountPrecision) -> GatewayResult<u64> {
        let inner = &self.gateway.inner;
        self.gateway
            .observe("count", &query.table, inner.count(query, precision))
            .await
    }
}
