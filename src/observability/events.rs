//! Observable events
//!
//! Every log line the service emits is named by one of these.

use std::fmt;

/// Observable events in the admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Configuration missing or invalid (FATAL)
    ConfigInvalid,
    /// Listener bound, serving requests
    ServerStart,
    /// Listener stopped
    ServerStop,

    // Requests
    /// Request finished (any status)
    RequestComplete,
    /// Request rejected before reaching the gateway
    ValidationRejected,
    /// Handler panicked and was converted to a 500
    HandlerPanic,
    /// Handler failed outside validation and the gateway, without panicking
    UnexpectedError,

    // Gateway
    /// Remote procedure or table call issued
    GatewayCall,
    /// Remote call failed
    GatewayCallFailed,

    // Cascading filters
    /// Lookup result discarded because a newer one was issued
    LookupStale,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigInvalid => "CONFIG_INVALID",
            Event::ServerStart => "SERVER_START",
            Event::ServerStop => "SERVER_STOP",
            Event::RequestComplete => "REQUEST_COMPLETE",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::HandlerPanic => "HANDLER_PANIC",
            Event::UnexpectedError => "UNEXPECTED_ERROR",
            Event::GatewayCall => "GATEWAY_CALL",
            Event::GatewayCallFailed => "GATEWAY_CALL_FAILED",
            Event::LookupStale => "LOOKUP_STALE",
        }
    }

    /// Returns true if this event means the process cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ConfigInvalid)
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::ConfigInvalid
                | Event::HandlerPanic
                | Event::UnexpectedError
                | Event::GatewayCallFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
