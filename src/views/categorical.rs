//! Outcome rates and counts of a categorical dataset.

use serde::Serialize;
use tracing::debug;

use crate::aggregation::{compute_counts, compute_outcome_rate, UndefinedRateWarning, NONE_SELECTION};
use crate::chart::{count_chart, rate_chart, ChartSpec};
use crate::error::SimpsonsResult;
use crate::registry::Registry;
use crate::views::with_none;

/// What caused the categorical view to recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalEvent<'a> {
    /// First load: the configured initial variable, no facet.
    Load,
    /// A new compare column was picked; the facet resets to none.
    CompareChanged(&'a str),
    /// The facet was picked for the current compare column.
    FacetChanged {
        compare: &'a str,
        facet: &'a str,
    },
}

/// Everything the categorical view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalView {
    pub title: String,
    pub question: String,
    pub compare_options: Vec<String>,
    pub compare: String,
    /// Compare options minus the selected compare column, plus `"none"`.
    pub facet_options: Vec<String>,
    pub facet: String,
    pub rate_chart: ChartSpec,
    pub count_chart: ChartSpec,
    pub warnings: Vec<UndefinedRateWarning>,
}

/// Recomputes the categorical view for one selection.
///
/// # Errors
///
/// Returns `SimpsonsError::Configuration` if the configuration is unknown or
/// incomplete, or the selection names unusable columns.
pub fn explore_categorical<R: Registry + ?Sized>(
    registry: &R,
    config_id: &str,
    event: CategoricalEvent<'_>,
) -> SimpsonsResult<CategoricalView> {
    let entry = registry.get(config_id)?;
    let (config, dataset) = (&entry.config, &entry.dataset);

    let (compare, facet) = match event {
        CategoricalEvent::Load => (config.initial_compare(dataset)?, NONE_SELECTION.to_string()),
        CategoricalEvent::CompareChanged(compare) => (compare.to_string(), NONE_SELECTION.to_string()),
        CategoricalEvent::FacetChanged { compare, facet } => (compare.to_string(), facet.to_string()),
    };

    let request = config.aggregation_request(&compare, &facet)?;
    let rates = compute_outcome_rate(dataset, &request)?;
    let counts = compute_counts(dataset, &request.count_request())?;

    let compare_options = config.compare_options(dataset);
    let facet_options = with_none(
        compare_options
            .iter()
            .filter(|c| **c != compare)
            .cloned()
            .collect(),
    );

    debug!(config_id, compare = %compare, facet = %facet, ?event, "categorical view recomputed");

    Ok(CategoricalView {
        title: config.title.clone(),
        question: config.question.clone(),
        rate_chart: rate_chart(&rates, config.rate_label()?)
            .with_category_orders(config.category_orders.clone()),
        count_chart: count_chart(&counts, &config.input_count_label)
            .with_category_orders(config.category_orders.clone()),
        warnings: rates.warnings,
        compare_options,
        compare,
        facet_options,
        facet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::registry::InMemoryRegistry;
    use crate::value::Value;
    use serde_json::json;

    fn registry() -> InMemoryRegistry {
        let registry = InMemoryRegistry::new();
        registry
            .insert_json(
                "admissions",
                &json!({
                    "title": "Admissions",
                    "question": "Who gets in?",
                    "outcome": "accepted",
                    "outcome_numerator": "yes",
                    "outcome_rate_label": "Acceptance rate",
                    "initial_variable": "gender"
                }),
                &json!([
                    {"dept": "A", "gender": "men", "accepted": "yes", "N": 80},
                    {"dept": "A", "gender": "men", "accepted": "no", "N": 20},
                    {"dept": "A", "gender": "women", "accepted": "yes", "N": 18},
                    {"dept": "A", "gender": "women", "accepted": "no", "N": 2},
                    {"dept": "B", "gender": "men", "accepted": "yes", "N": 10},
                    {"dept": "B", "gender": "men", "accepted": "no", "N": 30},
                    {"dept": "B", "gender": "women", "accepted": "yes", "N": 45},
                    {"dept": "B", "gender": "women", "accepted": "no", "N": 105}
                ]),
            )
            .unwrap();
        registry
    }

    #[test]
    fn initial_load_uses_initial_variable() {
        let view = explore_categorical(&registry(), "admissions", CategoricalEvent::Load).unwrap();
        assert_eq!(view.title, "Admissions");
        assert_eq!(view.compare, "gender");
        assert_eq!(view.facet, "none");
        assert_eq!(view.compare_options, vec!["dept", "gender"]);
        assert_eq!(view.facet_options, vec!["dept", "none"]);
        assert_eq!(view.rate_chart.kind, ChartKind::Bar);
        assert_eq!(view.count_chart.axis_titles.y, "Count");
    }

    #[test]
    fn compare_change_resets_facet() {
        let view = explore_categorical(&registry(), "admissions", CategoricalEvent::CompareChanged("dept")).unwrap();
        assert_eq!(view.compare, "dept");
        assert_eq!(view.facet, "none");
        assert_eq!(view.facet_options, vec!["gender", "none"]);
    }

    #[test]
    fn facet_shows_reversal() {
        let overall = explore_categorical(&registry(), "admissions", CategoricalEvent::Load).unwrap();
        let men = &overall.rate_chart.series[0].points;
        // men 90 / 140, women 63 / 170
        assert!(men[0].y > men[1].y);

        let split = explore_categorical(
            &registry(),
            "admissions",
            CategoricalEvent::FacetChanged { compare: "gender", facet: "dept" },
        )
        .unwrap();
        assert_eq!(split.rate_chart.kind, ChartKind::GroupedBar);
        for dept in &split.rate_chart.series {
            let men = dept.points.iter().find(|p| p.x == Value::from("men")).unwrap();
            let women = dept.points.iter().find(|p| p.x == Value::from("women")).unwrap();
            assert!(women.y > men.y, "{}", dept.name);
        }
    }

    #[test]
    fn unknown_config_and_bad_selection() {
        let err = explore_categorical(&registry(), "missing", CategoricalEvent::Load).unwrap_err();
        assert!(err.is_configuration());
        let err = explore_categorical(
            &registry(),
            "admissions",
            CategoricalEvent::FacetChanged { compare: "gender", facet: "gender" },
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
