//! Synthesis of weighted datasets from simulation parameters.

use tracing::{debug, warn};

use crate::aggregation::{compute_outcome_rate, AggregateResult, AggregationRequest, Facet};
use crate::dataset::{CategoryOrders, Dataset};
use crate::error::{SimpsonsResult, ValidationError};
use crate::simulation::params::{SimulationColumns, SimulationParameterSet};
use crate::value::Value;

/// Builds the weighted rows described by a parameter set.
///
/// For every dim1 category and each of the two dim2 categories, two rows are
/// emitted: one tagged with the numerator outcome carrying
/// `base_count × proportion × rate / 100`, and one tagged with the negative
/// label carrying the remainder. The two weights of a cell always sum to
/// `base_count × proportion`.
///
/// # Errors
///
/// Returns the first `ValidationError` of the parameter set; no dataset is
/// produced in that case.
///
/// # Examples
///
/// ```
/// use simpsons::{synthesize, CategoryParameters, SimulationColumns, SimulationParameterSet};
///
/// let columns = SimulationColumns::new("dept", "gender", "accepted", "yes").unwrap();
/// let params = SimulationParameterSet::new(
///     vec!["men".into(), "women".into()],
///     "men",
///     vec![CategoryParameters::new("A", 100.0, 50.0)
///         .base_rate("men", 80.0)
///         .base_rate("women", 60.0)],
/// );
///
/// let data = synthesize(&params, &columns).unwrap();
/// assert_eq!(data.len(), 4);
/// assert!((data.total_weight() - 100.0).abs() < 1e-9);
/// ```
pub fn synthesize(
    params: &SimulationParameterSet,
    columns: &SimulationColumns,
) -> Result<Dataset, ValidationError> {
    if let Err(err) = params.validate(columns) {
        warn!(dim1 = columns.dim1(), error = %err, "rejected simulation parameters");
        return Err(err);
    }

    let mut rows = Vec::with_capacity(params.categories.len() * params.split_categories.len() * 2);
    for category in &params.categories {
        for dim2 in &params.split_categories {
            let proportion = params.proportion(category, dim2);
            // validate() guarantees a rate for every cell.
            let rate = category.base_rates.get(dim2).copied().unwrap_or_default();
            let cell = category.base_count * proportion;
            rows.push(vec![
                Value::from(category.category.as_str()),
                Value::from(dim2.as_str()),
                columns.numerator().clone(),
                Value::from(cell * 0.01 * rate),
            ]);
            rows.push(vec![
                Value::from(category.category.as_str()),
                Value::from(dim2.as_str()),
                columns.negative_label().clone(),
                Value::from(cell * 0.01 * (100.0 - rate)),
            ]);
        }
    }

    debug!(
        dim1 = columns.dim1(),
        dim2 = columns.dim2(),
        categories = params.categories.len(),
        rows = rows.len(),
        "synthesized dataset"
    );

    Ok(Dataset::from_validated_rows(
        vec![
            columns.dim1().to_string(),
            columns.dim2().to_string(),
            columns.outcome().to_string(),
            columns.weight_column().to_string(),
        ],
        Some(columns.weight_column().to_string()),
        rows,
    ))
}

/// The aggregation a simulation run is displayed with.
///
/// Rates are compared across the dim2 categories; with `facet` on they are
/// split by dim1.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the columns cannot form a request.
pub fn simulation_request(
    columns: &SimulationColumns,
    facet: bool,
    category_orders: CategoryOrders,
) -> SimpsonsResult<AggregationRequest> {
    let facet = if facet {
        Facet::Dimension(columns.dim1().to_string())
    } else {
        Facet::None
    };
    Ok(AggregationRequest::builder()
        .compare(columns.dim2())
        .facet(facet)
        .outcome(columns.outcome())
        .numerator(columns.numerator().clone())
        .category_orders(category_orders)
        .build()?)
}

/// Synthesizes a dataset and aggregates it for display.
///
/// # Errors
///
/// Returns `SimpsonsError::Validation` for bad parameters and
/// `SimpsonsError::Configuration` if the aggregation cannot be formed.
pub fn simulate(
    params: &SimulationParameterSet,
    columns: &SimulationColumns,
    facet: bool,
    category_orders: CategoryOrders,
) -> SimpsonsResult<AggregateResult> {
    let data = synthesize(params, columns)?;
    let request = simulation_request(columns, facet, category_orders)?;
    Ok(compute_outcome_rate(&data, &request)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{compute_counts, CountRequest};
    use crate::simulation::params::CategoryParameters;

    fn columns() -> SimulationColumns {
        SimulationColumns::new("dept", "gender", "accepted", "yes").unwrap()
    }

    fn berkeley() -> SimulationParameterSet {
        SimulationParameterSet::new(
            vec!["men".into(), "women".into()],
            "men",
            vec![
                CategoryParameters::new("A", 100.0, 50.0)
                    .base_rate("men", 80.0)
                    .base_rate("women", 60.0),
                CategoryParameters::new("B", 400.0, 10.0)
                    .base_rate("men", 10.0)
                    .base_rate("women", 20.0),
            ],
        )
    }

    fn weight_of(data: &Dataset, dept: &str, gender: &str, outcome: &str) -> f64 {
        data.rows()
            .filter(|r| {
                r.get("dept") == Some(&Value::from(dept))
                    && r.get("gender") == Some(&Value::from(gender))
                    && r.get("accepted") == Some(&Value::from(outcome))
            })
            .map(|r| r.weight())
            .sum()
    }

    #[test]
    fn synthesize_single_category_example() {
        let data = synthesize(&berkeley(), &columns()).unwrap();
        assert!((weight_of(&data, "A", "men", "yes") - 40.0).abs() < 1e-9);
        assert!((weight_of(&data, "A", "men", "not") - 10.0).abs() < 1e-9);
        assert!((weight_of(&data, "A", "women", "yes") - 30.0).abs() < 1e-9);
        assert!((weight_of(&data, "A", "women", "not") - 20.0).abs() < 1e-9);
    }

    #[test]
    fn synthesize_conserves_cell_mass() {
        let params = berkeley();
        let data = synthesize(&params, &columns()).unwrap();
        for category in &params.categories {
            for gender in ["men", "women"] {
                let expected = category.base_count * params.proportion(category, gender);
                let actual = weight_of(&data, &category.category, gender, "yes")
                    + weight_of(&data, &category.category, gender, "not");
                assert!((actual - expected).abs() < 1e-9, "{} / {gender}", category.category);
            }
        }
        assert!((data.total_weight() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn synthesize_uses_configured_labels() {
        let columns = columns()
            .with_negative_label("rejected")
            .unwrap()
            .with_weight_column("count")
            .unwrap();
        let data = synthesize(&berkeley(), &columns).unwrap();
        assert_eq!(data.weight_column(), Some("count"));
        assert_eq!(data.columns(), ["dept", "gender", "accepted", "count"]);
        assert!(data
            .column("accepted")
            .unwrap()
            .all(|v| *v == Value::from("yes") || *v == Value::from("rejected")));
    }

    #[test]
    fn synthesize_rejects_invalid_set_without_output() {
        let mut params = berkeley();
        params.categories[1].base_rates.insert("women".into(), f64::NAN);
        let err = synthesize(&params, &columns()).unwrap_err();
        assert_eq!(err.category(), Some("B"));
    }

    #[test]
    fn simulate_shows_paradox() {
        let mut params = berkeley();
        params.categories[0].base_rates.insert("men".into(), 60.0);
        params.categories[0].base_rates.insert("women".into(), 80.0);

        let overall = simulate(&params, &columns(), false, CategoryOrders::new()).unwrap();
        assert_eq!(overall.facet_dimension, None);
        let men = overall.rate(&Value::from("men"), None).unwrap();
        let women = overall.rate(&Value::from("women"), None).unwrap();
        assert!(men > women, "men {men} vs women {women}");

        let split = simulate(&params, &columns(), true, CategoryOrders::new()).unwrap();
        assert_eq!(split.facet_dimension.as_deref(), Some("dept"));
        for dept in ["A", "B"] {
            let dept = Value::from(dept);
            let men = split.rate(&Value::from("men"), Some(&dept)).unwrap();
            let women = split.rate(&Value::from("women"), Some(&dept)).unwrap();
            assert!(women > men, "{dept}: men {men} vs women {women}");
        }
    }

    #[test]
    fn simulate_zero_count_category_is_flagged() {
        let mut params = berkeley();
        params.categories[0].base_count = 0.0;
        let split = simulate(&params, &columns(), true, CategoryOrders::new()).unwrap();
        assert_eq!(split.warnings.len(), 2);
        assert!((split.total_count() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn simulated_counts_follow_split() {
        let data = synthesize(&berkeley(), &columns()).unwrap();
        let counts = compute_counts(&data, &CountRequest::new("gender", Facet::None)).unwrap();
        // men: 50 + 40, women: 50 + 360
        assert!((counts.rows[0].count - 90.0).abs() < 1e-9);
        assert!((counts.rows[1].count - 410.0).abs() < 1e-9);
    }
}
