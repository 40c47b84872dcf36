//! Simulation of categorical datasets from a handful of parameters.
//!
//! A simulation describes a population by dim1 category: how many
//! observations it has, how they split across the two dim2 categories, and
//! the positive-outcome rate of each (dim1, dim2) cell. The synthesized rows
//! are then aggregated exactly like real data.

pub mod engine;
pub mod params;
pub mod suggest;

pub use engine::{simulate, simulation_request, synthesize};
pub use params::{
    CategoryParameters, RawCategoryInput, SimulationColumns, SimulationParameterSet,
    DEFAULT_NEGATIVE_LABEL, DEFAULT_WEIGHT_COLUMN,
};
pub use suggest::{median, suggest_parameters, RateRounding, SuggestedParameters};
