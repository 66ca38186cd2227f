//! # HTTP Server
//!
//! Combines all route groups into one router and serves it.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::{log_event, log_event_with_fields, Event};

use super::config::HttpServerConfig;
use super::devnet_routes::devnet_routes;
use super::listing_routes::listing_routes;
use super::middleware::{handle_panic, log_requests};
use super::observability_routes::{health_routes, observability_routes};
use super::reference_routes::reference_routes;
use super::state::AppState;
use super::vehicle_routes::vehicle_routes;

/// HTTP server for the admin API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, Arc::new(state));
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let api = Router::new()
            .merge(vehicle_routes(state.clone()))
            .merge(reference_routes(state.clone()))
            .merge(devnet_routes(state.clone()))
            .merge(listing_routes(state.clone()));

        Router::new()
            .merge(health_routes())
            .nest("/api", api)
            .nest("/observability", observability_routes(state.clone()))
            // innermost first: panics become 500s before the request is logged
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(middleware::from_fn_with_state(state, log_requests))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {e}", self.config.socket_addr()),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?.to_string();
        log_event_with_fields(Event::ServerStart, &[("addr", bound.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ServerStop);
        Ok(())
    }
}

async fn shutdown_signal() {
    // an error here means no signal handler; keep serving
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
