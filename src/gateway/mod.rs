//! # Remote Data Gateway
//!
//! Wraps the hosted database's REST and RPC surface. Handlers never see HTTP details
//! of the remote: they hold a [`PublicGateway`] or [`SessionGateway`] and get back
//! rows or a [`GatewayError`].

mod client;
pub mod demo;
mod errors;
mod http;
mod memory;
pub mod procedures;
mod query;
mod tiers;

pub use client::DataGateway;
pub use errors::{GatewayError, GatewayResult};
pub use http::{build_client, HttpGateway};
pub use memory::{GatewayCall, MemoryGateway};
pub use query::{CountPrecision, FilterExpr, FilterOperator, OrderBy, TableQuery};
pub(crate) use query::loosely_equal;
pub use tiers::{PublicGateway, SessionGateway};
