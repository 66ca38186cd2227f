//! assessor-admin - admin API for an assessor's office
//!
//! Bridges HTTP query parameters to a hosted database's REST and RPC surface, with
//! two credential tiers, uniform response envelopes, sequence-guarded cascading
//! filters and paginated listings.

pub mod api;
pub mod bridge;
pub mod cascade;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod http_server;
pub mod observability;
pub mod pagination;
