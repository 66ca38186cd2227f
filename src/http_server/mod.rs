//! # HTTP Server Module
//!
//! The admin API served with axum.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/*` - Vehicle guide lookups, reference tables, devnet data, paginated lists
//! - `/observability/*` - Health and counters

pub mod config;
pub mod devnet_routes;
pub mod listing_routes;
pub mod middleware;
pub mod observability_routes;
pub mod reference_routes;
pub mod server;
pub mod state;
pub mod vehicle_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use state::AppState;
