//! Interactive views over registered datasets.
//!
//! Each view is a function of the registry and the user's current selection;
//! it recomputes everything on every call and returns fresh chart
//! descriptors. Only the simulation view keeps state between calls, namely
//! its last good chart.

mod categorical;
mod continuous;
mod simulate;

pub use categorical::{explore_categorical, CategoricalEvent, CategoricalView};
pub use continuous::{explore_continuous, ContinuousView};
pub use simulate::{SimulationForm, SimulationSession};

use crate::aggregation::NONE_SELECTION;

/// Appends the "none" sentinel to a list of column options.
fn with_none(mut options: Vec<String>) -> Vec<String> {
    options.push(NONE_SELECTION.to_string());
    options
}
