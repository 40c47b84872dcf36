//! Aggregation requests.
//!
//! The `AggregationRequestBuilder` provides a fluent API for describing which
//! dimensions to group by and which outcome value counts as the numerator.

use serde::{Deserialize, Serialize};

use crate::dataset::{CategoryOrders, Dataset};
use crate::error::ConfigurationError;
use crate::value::Value;

/// Selection sentinel the UI uses for "no facet" / "no grouping".
pub const NONE_SELECTION: &str = "none";

/// Optional secondary grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// No secondary grouping.
    #[default]
    None,
    /// Split groups by this column.
    Dimension(String),
}

impl Facet {
    /// Interprets a UI selection, where `"none"` means no facet.
    #[must_use]
    pub fn from_selection(selection: &str) -> Self {
        if selection == NONE_SELECTION {
            Self::None
        } else {
            Self::Dimension(selection.to_string())
        }
    }

    /// The facet column name, if any.
    #[must_use]
    pub fn as_dimension(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Dimension(d) => Some(d),
        }
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The UI selection string for this facet.
    #[must_use]
    pub fn selection(&self) -> &str {
        self.as_dimension().unwrap_or(NONE_SELECTION)
    }
}

impl From<Option<String>> for Facet {
    fn from(v: Option<String>) -> Self {
        v.map_or(Self::None, Self::Dimension)
    }
}

/// Grouping for raw count summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRequest {
    /// Primary (x-axis) dimension.
    pub compare: String,
    /// Optional secondary dimension.
    pub facet: Facet,
    /// Display orderings; never affect computed values.
    #[serde(default)]
    pub category_orders: CategoryOrders,
}

impl CountRequest {
    /// Create a count request without display orderings.
    #[must_use]
    pub fn new(compare: impl Into<String>, facet: Facet) -> Self {
        Self {
            compare: compare.into(),
            facet,
            category_orders: CategoryOrders::new(),
        }
    }

    /// Attach display orderings.
    #[must_use]
    pub fn with_category_orders(mut self, orders: CategoryOrders) -> Self {
        self.category_orders = orders;
        self
    }

    /// Checks the grouping dimensions against a dataset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a dimension is missing, repeated, or
    /// is the weight column.
    pub fn validate_against(&self, dataset: &Dataset) -> Result<(), ConfigurationError> {
        if let Some(facet) = self.facet.as_dimension() {
            if facet == self.compare {
                return Err(ConfigurationError::DuplicateDimension {
                    dimension: facet.to_string(),
                });
            }
        }
        check_dimension(dataset, &self.compare)?;
        if let Some(facet) = self.facet.as_dimension() {
            check_dimension(dataset, facet)?;
        }
        Ok(())
    }
}

/// A request for outcome rates per (compare, facet) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    /// Primary (x-axis) dimension.
    pub compare: String,
    /// Optional secondary dimension.
    pub facet: Facet,
    /// Outcome column.
    pub outcome: String,
    /// Outcome value counted in the rate's numerator.
    pub numerator: Value,
    /// Display orderings; never affect computed values.
    #[serde(default)]
    pub category_orders: CategoryOrders,
}

impl AggregationRequest {
    /// Start building a request.
    #[must_use]
    pub fn builder() -> AggregationRequestBuilder {
        AggregationRequestBuilder::default()
    }

    /// The same grouping without the outcome split.
    #[must_use]
    pub fn count_request(&self) -> CountRequest {
        CountRequest {
            compare: self.compare.clone(),
            facet: self.facet.clone(),
            category_orders: self.category_orders.clone(),
        }
    }

    /// Checks every named dimension against a dataset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a dimension is missing, repeated, is
    /// the weight column, or if the numerator value never occurs in the
    /// outcome column of a non-empty dataset.
    pub fn validate_against(&self, dataset: &Dataset) -> Result<(), ConfigurationError> {
        self.check_roles()?;
        self.count_request().validate_against(dataset)?;
        check_dimension(dataset, &self.outcome)?;

        if !dataset.is_empty() && !dataset.column(&self.outcome)?.any(|v| *v == self.numerator) {
            return Err(ConfigurationError::UnknownOutcomeValue {
                column: self.outcome.clone(),
                value: self.numerator.to_string(),
            });
        }
        Ok(())
    }
}

impl AggregationRequest {
    /// Compare, facet and outcome must name three different columns.
    fn check_roles(&self) -> Result<(), ConfigurationError> {
        if self.compare == self.outcome {
            return Err(ConfigurationError::DuplicateDimension {
                dimension: self.compare.clone(),
            });
        }
        if let Some(facet) = self.facet.as_dimension() {
            if facet == self.compare || facet == self.outcome {
                return Err(ConfigurationError::DuplicateDimension {
                    dimension: facet.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_dimension(dataset: &Dataset, name: &str) -> Result<(), ConfigurationError> {
    dataset.column_index(name)?;
    if dataset.weight_column() == Some(name) {
        return Err(ConfigurationError::WeightColumnAsDimension {
            column: name.to_string(),
        });
    }
    Ok(())
}

/// Builder for [`AggregationRequest`].
#[derive(Debug, Clone, Default)]
pub struct AggregationRequestBuilder {
    compare: Option<String>,
    facet: Facet,
    outcome: Option<String>,
    numerator: Option<Value>,
    category_orders: CategoryOrders,
}

impl AggregationRequestBuilder {
    /// Set the compare dimension.
    #[must_use]
    pub fn compare(mut self, dimension: impl Into<String>) -> Self {
        self.compare = Some(dimension.into());
        self
    }

    /// Set the facet.
    #[must_use]
    pub fn facet(mut self, facet: Facet) -> Self {
        self.facet = facet;
        self
    }

    /// Set the facet from a UI selection (`"none"` clears it).
    #[must_use]
    pub fn facet_selection(mut self, selection: &str) -> Self {
        self.facet = Facet::from_selection(selection);
        self
    }

    /// Set the outcome column.
    #[must_use]
    pub fn outcome(mut self, dimension: impl Into<String>) -> Self {
        self.outcome = Some(dimension.into());
        self
    }

    /// Set the numerator outcome value.
    #[must_use]
    pub fn numerator(mut self, value: impl Into<Value>) -> Self {
        self.numerator = Some(value.into());
        self
    }

    /// Set display orderings.
    #[must_use]
    pub fn category_orders(mut self, orders: CategoryOrders) -> Self {
        self.category_orders = orders;
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingSetting` if compare, outcome or
    /// numerator is unset, and `DuplicateDimension` if two roles share a
    /// column.
    pub fn build(self) -> Result<AggregationRequest, ConfigurationError> {
        let compare = self.compare.ok_or_else(|| ConfigurationError::MissingSetting {
            setting: "compare".to_string(),
        })?;
        let outcome = self.outcome.ok_or_else(|| ConfigurationError::MissingSetting {
            setting: "outcome".to_string(),
        })?;
        let numerator = self.numerator.ok_or_else(|| ConfigurationError::MissingSetting {
            setting: "outcome_numerator".to_string(),
        })?;

        let request = AggregationRequest {
            compare,
            facet: self.facet,
            outcome,
            numerator,
            category_orders: self.category_orders,
        };
        request.check_roles()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Dataset {
        Dataset::builder(["dept", "gender", "accepted", "N"])
            .weight_column("N")
            .row(["A".into(), "men".into(), "yes".into(), Value::from(5.0)])
            .build()
            .unwrap()
    }

    #[test]
    fn facet_from_selection() {
        assert_eq!(Facet::from_selection("none"), Facet::None);
        assert_eq!(
            Facet::from_selection("gender"),
            Facet::Dimension("gender".to_string())
        );
        assert_eq!(Facet::Dimension("gender".into()).selection(), "gender");
        assert_eq!(Facet::None.selection(), "none");
    }

    #[test]
    fn builder_requires_fields() {
        let err = AggregationRequest::builder().compare("dept").build().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingSetting {
                setting: "outcome".to_string()
            }
        );
    }

    #[test]
    fn builder_rejects_duplicate_dimensions() {
        let err = AggregationRequest::builder()
            .compare("dept")
            .facet_selection("dept")
            .outcome("accepted")
            .numerator("yes")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateDimension { .. }));

        let err = AggregationRequest::builder()
            .compare("accepted")
            .outcome("accepted")
            .numerator("yes")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateDimension { .. }));
    }

    #[test]
    fn validate_rejects_missing_column() {
        let req = AggregationRequest::builder()
            .compare("major")
            .outcome("accepted")
            .numerator("yes")
            .build()
            .unwrap();
        assert!(matches!(
            req.validate_against(&data()),
            Err(ConfigurationError::MissingColumn { .. })
        ));
    }

    #[test]
    fn validate_rejects_weight_column() {
        let req = AggregationRequest::builder()
            .compare("N")
            .outcome("accepted")
            .numerator("yes")
            .build()
            .unwrap();
        assert!(matches!(
            req.validate_against(&data()),
            Err(ConfigurationError::WeightColumnAsDimension { .. })
        ));
    }

    #[test]
    fn validate_rejects_unobserved_numerator() {
        let req = AggregationRequest::builder()
            .compare("dept")
            .outcome("accepted")
            .numerator("maybe")
            .build()
            .unwrap();
        assert!(matches!(
            req.validate_against(&data()),
            Err(ConfigurationError::UnknownOutcomeValue { .. })
        ));
    }

    #[test]
    fn deserialized_request_is_checked_against_dataset() {
        let req: AggregationRequest = serde_json::from_value(serde_json::json!({
            "compare": "accepted",
            "facet": "none",
            "outcome": "accepted",
            "numerator": "yes"
        }))
        .unwrap();
        assert!(matches!(
            req.validate_against(&data()),
            Err(ConfigurationError::DuplicateDimension { .. })
        ));

        let req: AggregationRequest = serde_json::from_value(serde_json::json!({
            "compare": "dept",
            "facet": {"dimension": "accepted"},
            "outcome": "accepted",
            "numerator": "yes"
        }))
        .unwrap();
        assert!(matches!(
            req.validate_against(&data()),
            Err(ConfigurationError::DuplicateDimension { .. })
        ));
    }

    #[test]
    fn count_request_mirrors_grouping() {
        let req = AggregationRequest::builder()
            .compare("dept")
            .facet_selection("gender")
            .outcome("accepted")
            .numerator("yes")
            .build()
            .unwrap();
        let counts = req.count_request();
        assert_eq!(counts.compare, "dept");
        assert_eq!(counts.facet, Facet::Dimension("gender".to_string()));
        counts.validate_against(&data()).unwrap();
    }
}
