//! # In-Memory Gateway
//!
//! Holds tables and procedure handlers in process. Supports failure injection and,
//! when enabled with [`MemoryGateway::with_recording`], records every call so tests can
//! assert that rejected requests never reach the gateway.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::client::DataGateway;
use super::errors::{GatewayError, GatewayResult};
use super::query::{CountPrecision, TableQuery};

type ProcedureHandler = Box<dyn Fn(&Value) -> GatewayResult<Value> + Send + Sync>;

/// A call observed by the memory gateway
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Procedure { name: String, args: Value },
    Select { table: String },
    Count { table: String, precision: CountPrecision },
}

impl GatewayCall {
    /// The procedure or table the call targeted
    pub fn target(&self) -> &str {
        match self {
            GatewayCall::Procedure { name, .. } => name,
            GatewayCall::Select { table } | GatewayCall::Count { table, .. } => table,
        }
    }
}

/// In-process data gateway
#[derive(Default)]
pub struct MemoryGateway {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    procedures: RwLock<HashMap<String, ProcedureHandler>>,
    /// Injected failures keyed by target; counts use `count:<table>`
    failures: RwLock<HashMap<String, GatewayError>>,
    calls: Mutex<Vec<GatewayCall>>,
    recording: bool,
}

fn poisoned() -> GatewayError {
    GatewayError::Transport("memory gateway lock poisoned".to_string())
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a log of every call; off by default so long-running demo servers stay flat
    pub fn with_recording(mut self) -> Self {
        self.recording = true;
        self
    }

    /// Add or replace a table
    pub fn with_table(self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(name.into(), rows);
        }
        self
    }

    /// Register a procedure handler
    pub fn with_procedure<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value) -> GatewayResult<Value> + Send + Sync + 'static,
    {
        if let Ok(mut procedures) = self.procedures.write() {
            procedures.insert(name.into(), Box::new(handler));
        }
        self
    }

    /// Register a procedure that always returns `result`
    pub fn with_fixed_procedure(self, name: impl Into<String>, result: Value) -> Self {
        self.with_procedure(name, move |_| Ok(result.clone()))
    }

    /// Make every call to `target` fail with `error`
    pub fn fail(&self, target: impl Into<String>, error: GatewayError) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert(target.into(), error);
        }
    }

    /// Make counts over `table` fail with `error`
    pub fn fail_count(&self, table: &str, error: GatewayError) {
        self.fail(format!("count:{table}"), error);
    }

    /// Remove an injected failure
    pub fn heal(&self, target: &str) {
        if let Ok(mut failures) = self.failures.write() {
            failures.remove(target);
        }
    }

    /// All calls observed so far; empty unless recording
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls observed so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn record(&self, call: GatewayCall) {
        if !self.recording {
            return;
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn injected(&self, key: &str) -> GatewayResult<()> {
        let failures = self.failures.read().map_err(|_| poisoned())?;
        match failures.get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn table_rows(&self, table: &str) -> GatewayResult<Vec<Value>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        tables.get(table).cloned().ok_or_else(|| {
            GatewayError::remote(404, format!("relation \"public.{table}\" does not exist"))
        })
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn call(&self, procedure: &str, args: Value) -> GatewayResult<Value> {
        self.record(GatewayCall::Procedure {
            name: procedure.to_string(),
            args: args.clone(),
        });
        self.injected(procedure)?;

        let procedures = self.procedures.read().map_err(|_| poisoned())?;
        let handler = procedures.get(procedure).ok_or_else(|| {
            GatewayError::remote(
                404,
                format!("Could not find the function public.{procedure} in the schema cache"),
            )
        })?;
        handler(&args)
    }

    async fn select(&self, query: &TableQuery) -> GatewayResult<Vec<Value>> {
        self.record(GatewayCall::Select {
            table: query.table.clone(),
        });
        self.injected(&query.table)?;

        let rows = self.table_rows(&query.table)?;
        Ok(query.evaluate(&rows))
    }

    async fn count(&self, query: &TableQuery, precision: CountPrecision) -> GatewayResult<u64> {
        self.record(GatewayCall::Count {
            table: query.table.clone(),
            precision,
        });
        self.injected(&format!("count:{}", query.table))?;

        let rows = self.table_rows(&query.table)?;
        Ok(rows.iter().filter(|r| query.matches(r)).count() as u64)
    }
}
