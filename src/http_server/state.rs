//! Shared handler state
//!
//! Built once at startup: one pooled HTTP client, one handle per credential tier and
//! the process-wide counters.

use std::sync::Arc;

use crate::config::ResolvedGateway;
use crate::gateway::demo::demo_gateway;
use crate::gateway::{
    build_client, DataGateway, GatewayResult, HttpGateway, PublicGateway, SessionGateway,
};
use crate::observability::MetricsRegistry;

/// State shared across all handlers
pub struct AppState {
    /// Anonymous key; reference tables only
    pub public: PublicGateway,
    /// Session key; procedures, filtered search and paginated lists
    pub session: SessionGateway,
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    pub fn new(public: Arc<dyn DataGateway>, session: Arc<dyn DataGateway>) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        Self {
            public: PublicGateway::new(public).with_metrics(metrics.clone()),
            session: SessionGateway::new(session).with_metrics(metrics.clone()),
            metrics,
        }
    }

    /// Both tiers over the same backend (memory mode and tests)
    pub fn single(backend: Arc<dyn DataGateway>) -> Self {
        Self::new(backend.clone(), backend)
    }

    /// Connect both tiers to the hosted database, sharing one connection pool
    pub fn connect(gateway: &ResolvedGateway) -> GatewayResult<Self> {
        let client = build_client(gateway.timeout)?;
        let public = HttpGateway::new(client.clone(), &gateway.url, &gateway.anon_key)?;
        let session = HttpGateway::new(client, &gateway.url, &gateway.session_key)?;
        Ok(Self::new(Arc::new(public), Arc::new(session)))
    }

    /// Seeded in-process data, no credentials needed
    pub fn demo() -> Self {
        Self::single(Arc::new(demo_gateway()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_connect_builds_both_tiers() {
        let resolved = ResolvedGateway {
            url: "https://db.example.org".to_string(),
            anon_key: "anon".to_string(),
            session_key: "session".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(AppState::connect(&resolved).is_ok());
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let resolved = ResolvedGateway {
            url: "not a url".to_string(),
            anon_key: "anon".to_string(),
            session_key: "session".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(AppState::connect(&resolved).is_err());
    }
}
