//! Scatter plot with linear trends of two continuous columns.

use serde::Serialize;
use tracing::debug;

use crate::aggregation::Facet;
use crate::chart::{trend_chart, ChartSpec};
use crate::error::{InsufficientDataError, SimpsonsResult};
use crate::registry::Registry;
use crate::trend::fit_trend;
use crate::views::with_none;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuousView {
    pub title: String,
    pub question: String,
    /// Columns outside the continuous pair and the weight, plus `"none"`.
    pub group_options: Vec<String>,
    pub group: String,
    pub chart: ChartSpec,
    /// Partitions drawn without a trend line.
    pub skipped: Vec<InsufficientDataError>,
}

/// Recomputes the continuous view for a group selection (`"none"` for all
/// rows together).
///
/// # Errors
///
/// Returns `SimpsonsError::Configuration` if the configuration is unknown,
/// lacks a continuous pair, or the columns are unusable.
pub fn explore_continuous<R: Registry + ?Sized>(
    registry: &R,
    config_id: &str,
    group_selection: &str,
) -> SimpsonsResult<ContinuousView> {
    let entry = registry.get(config_id)?;
    let (config, dataset) = (&entry.config, &entry.dataset);
    let (x, y) = config.continuous_pair()?;

    let trend = fit_trend(dataset, x, y, &Facet::from_selection(group_selection))?;
    let skipped: Vec<InsufficientDataError> = trend.skipped().cloned().collect();

    let group_options = with_none(
        dataset
            .columns()
            .iter()
            .filter(|c| c.as_str() != x && c.as_str() != y && **c != config.weight_column)
            .cloned()
            .collect(),
    );

    debug!(
        config_id,
        group = group_selection,
        partitions = trend.partitions.len(),
        skipped = skipped.len(),
        "continuous view recomputed"
    );

    Ok(ContinuousView {
        title: config.title.clone(),
        question: config.question.clone(),
        group_options,
        group: group_selection.to_string(),
        chart: trend_chart(&trend),
        skipped,
    })
}
