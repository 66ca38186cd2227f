//! # API Boundary
//!
//! Error taxonomy and response envelopes shared by every route.

pub mod errors;
pub mod response;

pub use errors::{ApiError, ApiResult, ErrorBody, UNEXPECTED_MESSAGE};
pub use response::{respond, rows_or_empty, Envelope};
