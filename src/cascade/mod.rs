//! # Cascading Filters
//!
//! Dependent filter chains where each level's options are looked up from the values
//! selected before it. Lookups are sequence-guarded so out-of-order results never
//! replace newer ones.

pub mod chain;
pub mod driver;
pub mod options;
pub mod source;

pub use chain::{
    ApplyOutcome, CascadeError, CascadeResult, ChainSpec, FilterChain, LevelSpec, LevelState,
    LookupTicket,
};
pub use driver::{CascadeDriver, OptionSource};
pub use options::{FilterSet, FilterValue, OptionList, Scalar};
pub use source::GatewayOptionSource;
