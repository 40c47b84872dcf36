//! Grouped outcome rates and counts.
//!
//! Aggregation is a pure function of a borrowed [`Dataset`](crate::Dataset)
//! and a request: no observation is created or dropped, so the summed group
//! totals always equal the dataset's total weight.

pub mod engine;
pub mod request;

pub use engine::{
    compute_counts, compute_outcome_rate, AggregateResult, CountResult, CountRow, RateRow,
    UndefinedRateWarning,
};
pub use request::{AggregationRequest, AggregationRequestBuilder, CountRequest, Facet, NONE_SELECTION};
