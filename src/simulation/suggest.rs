//! Default simulation parameters derived from observed data.
//!
//! Suggestions pre-populate the simulation inputs so that the first run
//! reproduces the real dataset. Display rounding applies to the suggested
//! base rates only; synthesis always uses whatever numbers it is given.

use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregation::{compute_counts, compute_outcome_rate, AggregationRequest, CountRequest, Facet};
use crate::dataset::Dataset;
use crate::error::{SimpsonsResult, ValidationError};
use crate::simulation::params::{CategoryParameters, SimulationColumns, SimulationParameterSet};

/// Median base rate above which suggestions are rounded to whole percent.
pub const WHOLE_PERCENT_MEDIAN_THRESHOLD: f64 = 20.0;

/// How suggested base rates were rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateRounding {
    WholePercent,
    TwoDecimals,
}

impl RateRounding {
    /// Picks the rounding for a set of base rates from their median.
    #[must_use]
    pub fn for_median(median: f64) -> Self {
        if median > WHOLE_PERCENT_MEDIAN_THRESHOLD {
            Self::WholePercent
        } else {
            Self::TwoDecimals
        }
    }

    /// Rounds half to even, like the array rounding the defaults were first
    /// computed with.
    #[must_use]
    pub fn apply(self, rate: f64) -> f64 {
        match self {
            Self::WholePercent => rate.round_ties_even(),
            Self::TwoDecimals => (rate * 100.0).round_ties_even() / 100.0,
        }
    }
}

/// Median of the finite values, or `None` if there are none.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Suggested parameters plus how their base rates were rounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedParameters {
    pub parameters: SimulationParameterSet,
    pub rounding: RateRounding,
    /// Median of the unrounded cell base rates.
    pub median_base_rate: Option<f64>,
}

/// Derives default simulation parameters from a real dataset.
///
/// - base count: total weight of each dim1 category
/// - pivot: the first dim2 category in ascending order
/// - split: `100 × pivot weight / category weight`, truncated to an integer
/// - base rates: observed outcome rate of each (dim1, dim2) cell, rounded for
///   display by [`RateRounding::for_median`]
///
/// Cells with no observations get a base rate of 0.
///
/// # Errors
///
/// Returns `SimpsonsError::Configuration` if a column is missing and
/// `SimpsonsError::Validation` unless dim2 has exactly two categories.
pub fn suggest_parameters(
    dataset: &Dataset,
    columns: &SimulationColumns,
) -> SimpsonsResult<SuggestedParameters> {
    let split_values = dataset.dimension(columns.dim2())?.sorted_values();
    if split_values.len() != 2 {
        return Err(ValidationError::SplitCardinality {
            dimension: columns.dim2().to_string(),
            found: split_values.len(),
        }
        .into());
    }
    let split_categories: Vec<String> = split_values.iter().map(|v| v.label()).collect();
    let pivot = split_categories[0].clone();

    let totals = compute_counts(dataset, &CountRequest::new(columns.dim1(), Facet::None))?;
    let cells = compute_counts(
        dataset,
        &CountRequest::new(columns.dim1(), Facet::Dimension(columns.dim2().to_string())),
    )?;
    let request = AggregationRequest::builder()
        .compare(columns.dim1())
        .facet(Facet::Dimension(columns.dim2().to_string()))
        .outcome(columns.outcome())
        .numerator(columns.numerator().clone())
        .build()?;
    let rates = compute_outcome_rate(dataset, &request)?;

    let raw_rates: Vec<f64> = rates.rows.iter().filter_map(|r| r.rate).collect();
    let median_base_rate = median(&raw_rates);
    let rounding = RateRounding::for_median(median_base_rate.unwrap_or(0.0));

    let mut categories = Vec::with_capacity(totals.rows.len());
    for total in &totals.rows {
        let pivot_count: f64 = cells
            .rows
            .iter()
            .filter(|c| c.compare_value == total.compare_value)
            .filter(|c| c.facet_value.as_ref() == Some(&split_values[0]))
            .map(|c| c.count)
            .sum();
        let split_percent = if total.count > 0.0 {
            (100.0 * pivot_count / total.count).trunc()
        } else {
            0.0
        };

        let mut params = CategoryParameters::new(total.compare_value.label(), total.count, split_percent);
        for (value, label) in split_values.iter().zip(&split_categories) {
            let rate = rates.rate(&total.compare_value, Some(value)).unwrap_or_else(|| {
                warn!(
                    dim1 = %total.compare_value,
                    dim2 = %label,
                    "no observations for cell; suggesting a base rate of 0"
                );
                0.0
            });
            params = params.base_rate(label.clone(), rounding.apply(rate));
        }
        categories.push(params);
    }

    debug!(
        dim1 = columns.dim1(),
        dim2 = columns.dim2(),
        categories = categories.len(),
        ?rounding,
        "suggested simulation parameters"
    );

    Ok(SuggestedParameters {
        parameters: SimulationParameterSet::new(split_categories, pivot, categories),
        rounding,
        median_base_rate,
    })
}
