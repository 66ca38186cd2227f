//! # Query Parameter Bridge
//!
//! Turns query-string parameters into validated procedure arguments and table queries.

pub mod params;

pub use params::RequestParams;
