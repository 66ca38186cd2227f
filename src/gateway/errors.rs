//! # Gateway Errors
//!
//! Every remote failure is captured as a `GatewayError` value. Nothing escapes the
//! gateway boundary as a panic.

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote data gateway errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Connection, TLS or timeout failure before a response arrived
    #[error("gateway transport failed: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The remote answered 2xx but the body was not what the call expects
    #[error("could not decode gateway response: {0}")]
    Decode(String),

    /// The call could not be issued (bad identifier, bad header value)
    #[error("invalid gateway request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Build a remote error from status and message
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Remote HTTP status, if the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Remote { .. } => "remote",
            Self::Decode(_) => "decode",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
