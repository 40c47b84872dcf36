//! # simpsons - Simpson's Paradox aggregation and simulation
//!
//! Computes outcome rates over weighted categorical data, optionally split by
//! a second (facet) dimension, so that a trend in the aggregate can be seen
//! to reverse within every subgroup. Also fits per-group linear trends over
//! continuous data and synthesizes categorical datasets from a handful of
//! parameters.
//!
//! ## Core Concepts
//!
//! - **Dataset**: immutable rows with an optional weight (count) column
//! - **AggregationRequest**: compare dimension, optional facet, outcome and numerator
//! - **SimulationParameterSet**: per-category counts, split and base rates
//! - **ChartSpec**: renderer-agnostic chart descriptor built from engine results
//!
//! ## Usage
//!
//! ```rust
//! use simpsons::{compute_outcome_rate, AggregationRequest, Dataset, Value};
//!
//! let data = Dataset::builder(["dept", "accepted", "N"])
//!     .weight_column("N")
//!     .row(["A".into(), "yes".into(), Value::from(90.0)])
//!     .row(["A".into(), "no".into(), Value::from(10.0)])
//!     .row(["B".into(), "yes".into(), Value::from(20.0)])
//!     .row(["B".into(), "no".into(), Value::from(80.0)])
//!     .build()?;
//!
//! let request = AggregationRequest::builder()
//!     .compare("dept")
//!     .outcome("accepted")
//!     .numerator("yes")
//!     .build()?;
//!
//! let result = compute_outcome_rate(&data, &request)?;
//! assert_eq!(result.rate(&"A".into(), None), Some(90.0));
//! assert_eq!(result.rate(&"B".into(), None), Some(20.0));
//! # Ok::<(), simpsons::SimpsonsError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod dataset;
pub mod error;
pub mod value;

// Engines
pub mod aggregation;
pub mod simulation;
pub mod trend;

// Presentation and wiring
pub mod chart;
pub mod config;
pub mod registry;
pub mod views;

// Re-export primary types at crate root for convenience
pub use dataset::{CategoryOrders, Dataset, DatasetBuilder, Dimension, Row};
pub use error::{
    ConfigurationError, InsufficientDataError, SimpsonsError, SimpsonsResult, ValidationError,
};
pub use value::Value;

pub use aggregation::{
    compute_counts, compute_outcome_rate, AggregateResult, AggregationRequest,
    AggregationRequestBuilder, CountRequest, CountResult, CountRow, Facet, RateRow,
    UndefinedRateWarning, NONE_SELECTION,
};
pub use simulation::{
    simulate, suggest_parameters, synthesize, CategoryParameters, RateRounding, RawCategoryInput,
    SimulationColumns, SimulationParameterSet, SuggestedParameters,
};
pub use trend::{fit_line, fit_trend, TrendLine, TrendPartition, TrendPoint, TrendResult};

pub use chart::{count_chart, rate_chart, trend_chart, ChartKind, ChartSpec, Series};
pub use config::ExplorerConfig;
pub use registry::{InMemoryRegistry, Registry, RegistryEntry};
pub use views::{
    explore_categorical, explore_continuous, CategoricalEvent, CategoricalView, ContinuousView,
    SimulationForm, SimulationSession,
};
