//! Observability for the admin API
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle and request events
//! - Monotonic counters served at `/observability/metrics`
//!
//! # Usage
//!
//! ```ignore
//! use assessor_admin::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::info("LOOKUP", &[("procedure", "get_distinct_guide_years")]);
//! log_event_with_fields(Event::ServerStart, &[("addr", "0.0.0.0:8080")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}
