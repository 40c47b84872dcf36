//! Weighted grouping of datasets into outcome rates and counts.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregation::request::{AggregationRequest, CountRequest};
use crate::dataset::{display_cmp, CategoryOrders, Dataset};
use crate::error::ConfigurationError;
use crate::value::Value;

type GroupKey = (Value, Option<Value>);

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    numerator: f64,
    total: f64,
}

/// One (compare, facet) group of an outcome-rate aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub compare_value: Value,
    pub facet_value: Option<Value>,
    /// Percentage in `[0, 100]`; `None` when the group has zero weight.
    pub rate: Option<f64>,
    /// Summed weight of the numerator outcome.
    pub numerator_count: f64,
    /// Summed weight across all outcomes.
    pub total_count: f64,
}

/// A group whose rate is undefined because its total weight is zero.
///
/// The row stays in the result with `rate: None`; this record lets the caller
/// surface the gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndefinedRateWarning {
    pub compare_value: Value,
    pub facet_value: Option<Value>,
}

impl std::fmt::Display for UndefinedRateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.facet_value {
            Some(facet) => write!(f, "rate undefined for {} / {facet} (zero weight)", self.compare_value),
            None => write!(f, "rate undefined for {} (zero weight)", self.compare_value),
        }
    }
}

/// Outcome rates per group, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub compare_dimension: String,
    pub facet_dimension: Option<String>,
    pub outcome_dimension: String,
    pub numerator: Value,
    pub rows: Vec<RateRow>,
    pub warnings: Vec<UndefinedRateWarning>,
}

impl AggregateResult {
    /// Sum of `total_count` across groups.
    #[must_use]
    pub fn total_count(&self) -> f64 {
        self.rows.iter().map(|r| r.total_count).sum()
    }

    /// Looks up one group.
    #[must_use]
    pub fn get(&self, compare: &Value, facet: Option<&Value>) -> Option<&RateRow> {
        self.rows
            .iter()
            .find(|r| r.compare_value == *compare && r.facet_value.as_ref() == facet)
    }

    /// Rate of one group, if the group exists and has weight.
    #[must_use]
    pub fn rate(&self, compare: &Value, facet: Option<&Value>) -> Option<f64> {
        self.get(compare, facet).and_then(|r| r.rate)
    }

    /// Whether every group has a defined rate.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// One (compare, facet) group of a count aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub compare_value: Value,
    pub facet_value: Option<Value>,
    pub count: f64,
}

/// Summed weights per group, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountResult {
    pub compare_dimension: String,
    pub facet_dimension: Option<String>,
    pub rows: Vec<CountRow>,
}

impl CountResult {
    /// Sum of counts across groups.
    #[must_use]
    pub fn total_count(&self) -> f64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Column positions used while scanning rows.
struct Grouping {
    compare: usize,
    facet: Option<usize>,
}

impl Grouping {
    fn resolve(dataset: &Dataset, request: &CountRequest) -> Result<Self, ConfigurationError> {
        Ok(Self {
            compare: dataset.column_index(&request.compare)?,
            facet: request
                .facet
                .as_dimension()
                .map(|f| dataset.column_index(f))
                .transpose()?,
        })
    }

    fn key(&self, row: &crate::dataset::Row<'_>) -> GroupKey {
        (
            row.at(self.compare).clone(),
            self.facet.map(|f| row.at(f).clone()),
        )
    }
}

/// Sorts groups ascending, then applies any configured display orderings.
fn display_sort<T>(
    rows: &mut [T],
    compare: &str,
    facet: Option<&str>,
    orders: &CategoryOrders,
    key: impl Fn(&T) -> (&Value, Option<&Value>),
) {
    let compare_order = orders.get(compare).map(Vec::as_slice);
    let facet_order = facet.and_then(|f| orders.get(f)).map(Vec::as_slice);
    rows.sort_by(|a, b| {
        let (ca, fa) = key(a);
        let (cb, fb) = key(b);
        display_cmp(compare_order, ca, cb).then_with(|| match (fa, fb) {
            (Some(x), Some(y)) => display_cmp(facet_order, x, y),
            _ => std::cmp::Ordering::Equal,
        })
    });
}

/// Computes the outcome rate of every (compare, facet) group.
///
/// Rows are grouped by the compare dimension (and the facet, when set); within
/// a group, `rate = 100 × numerator weight / total weight`. Groups with zero
/// total weight are kept with `rate: None` and reported in `warnings`.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the request does not fit the dataset.
///
/// # Examples
///
/// ```
/// use simpsons::{compute_outcome_rate, AggregationRequest, Dataset, Value};
///
/// let data = Dataset::builder(["dept", "accepted", "N"])
///     .weight_column("N")
///     .row(["A".into(), "yes".into(), Value::from(90.0)])
///     .row(["A".into(), "no".into(), Value::from(10.0)])
///     .build()
///     .unwrap();
/// let request = AggregationRequest::builder()
///     .compare("dept")
///     .outcome("accepted")
///     .numerator("yes")
///     .build()
///     .unwrap();
///
/// let result = compute_outcome_rate(&data, &request).unwrap();
/// assert_eq!(result.rate(&Value::from("A"), None), Some(90.0));
/// ```
pub fn compute_outcome_rate(
    dataset: &Dataset,
    request: &AggregationRequest,
) -> Result<AggregateResult, ConfigurationError> {
    request.validate_against(dataset)?;
    let count_request = request.count_request();
    let grouping = Grouping::resolve(dataset, &count_request)?;
    let outcome = dataset.column_index(&request.outcome)?;

    let mut groups: BTreeMap<GroupKey, Tally> = BTreeMap::new();
    for row in dataset.rows() {
        let weight = row.weight();
        let tally = groups.entry(grouping.key(&row)).or_default();
        tally.total += weight;
        if *row.at(outcome) == request.numerator {
            tally.numerator += weight;
        }
    }

    let mut rows: Vec<RateRow> = groups
        .into_iter()
        .map(|((compare_value, facet_value), tally)| RateRow {
            compare_value,
            facet_value,
            rate: (tally.total > 0.0).then(|| 100.0 * tally.numerator / tally.total),
            numerator_count: tally.numerator,
            total_count: tally.total,
        })
        .collect();
    display_sort(
        &mut rows,
        &request.compare,
        request.facet.as_dimension(),
        &request.category_orders,
        |r| (&r.compare_value, r.facet_value.as_ref()),
    );

    let warnings: Vec<UndefinedRateWarning> = rows
        .iter()
        .filter(|r| r.rate.is_none())
        .map(|r| UndefinedRateWarning {
            compare_value: r.compare_value.clone(),
            facet_value: r.facet_value.clone(),
        })
        .collect();
    for w in &warnings {
        warn!(compare = %request.compare, "{w}");
    }

    debug!(
        compare = %request.compare,
        facet = request.facet.selection(),
        outcome = %request.outcome,
        groups = rows.len(),
        "computed outcome rates"
    );

    Ok(AggregateResult {
        compare_dimension: request.compare.clone(),
        facet_dimension: request.facet.as_dimension().map(str::to_string),
        outcome_dimension: request.outcome.clone(),
        numerator: request.numerator.clone(),
        rows,
        warnings,
    })
}

/// Sums weights per (compare, facet) group.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the request does not fit the dataset.
pub fn compute_counts(
    dataset: &Dataset,
    request: &CountRequest,
) -> Result<CountResult, ConfigurationError> {
    request.validate_against(dataset)?;
    let grouping = Grouping::resolve(dataset, request)?;

    let mut groups: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for row in dataset.rows() {
        *groups.entry(grouping.key(&row)).or_default() += row.weight();
    }

    let mut rows: Vec<CountRow> = groups
        .into_iter()
        .map(|((compare_value, facet_value), count)| CountRow {
            compare_value,
            facet_value,
            count,
        })
        .collect();
    display_sort(
        &mut rows,
        &request.compare,
        request.facet.as_dimension(),
        &request.category_orders,
        |r| (&r.compare_value, r.facet_value.as_ref()),
    );

    debug!(
        compare = %request.compare,
        facet = request.facet.selection(),
        groups = rows.len(),
        "computed counts"
    );

    Ok(CountResult {
        compare_dimension: request.compare.clone(),
        facet_dimension: request.facet.as_dimension().map(str::to_string),
        rows,
    })
}
