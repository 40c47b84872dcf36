//! Simulation parameters and their validation.
//!
//! The UI hands over either typed [`CategoryParameters`] or the raw text of
//! its input widgets as [`RawCategoryInput`]; both end up in a
//! [`SimulationParameterSet`] that is validated before any row is
//! synthesized.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ValidationError};
use crate::value::Value;

/// Default outcome label for synthesized negative rows.
pub const DEFAULT_NEGATIVE_LABEL: &str = "not";

/// Default name of the weight column of synthesized datasets.
pub const DEFAULT_WEIGHT_COLUMN: &str = "N";

const FIELD_BASE_COUNT: &str = "base count";
const FIELD_SPLIT: &str = "split %";

/// Column roles of a simulated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColumnRoles")]
pub struct SimulationColumns {
    dim1: String,
    dim2: String,
    outcome: String,
    numerator: Value,
    negative_label: Value,
    weight_column: String,
}

/// Unchecked wire form of [`SimulationColumns`].
#[derive(Deserialize)]
struct ColumnRoles {
    dim1: String,
    dim2: String,
    outcome: String,
    numerator: Value,
    #[serde(default = "default_negative_label")]
    negative_label: Value,
    #[serde(default = "default_weight_column")]
    weight_column: String,
}

fn default_negative_label() -> Value {
    Value::from(DEFAULT_NEGATIVE_LABEL)
}

fn default_weight_column() -> String {
    DEFAULT_WEIGHT_COLUMN.to_string()
}

impl TryFrom<ColumnRoles> for SimulationColumns {
    type Error = ConfigurationError;

    fn try_from(raw: ColumnRoles) -> Result<Self, Self::Error> {
        let columns = Self {
            dim1: raw.dim1,
            dim2: raw.dim2,
            outcome: raw.outcome,
            numerator: raw.numerator,
            negative_label: raw.negative_label,
            weight_column: raw.weight_column,
        };
        columns.check_distinct()?;
        columns.check_labels()?;
        Ok(columns)
    }
}

impl SimulationColumns {
    /// Create column roles with the default negative label and weight column.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DuplicateDimension` if two roles share a
    /// column name.
    pub fn new(
        dim1: impl Into<String>,
        dim2: impl Into<String>,
        outcome: impl Into<String>,
        numerator: impl Into<Value>,
    ) -> Result<Self, ConfigurationError> {
        let columns = Self {
            dim1: dim1.into(),
            dim2: dim2.into(),
            outcome: outcome.into(),
            numerator: numerator.into(),
            negative_label: Value::from(DEFAULT_NEGATIVE_LABEL),
            weight_column: DEFAULT_WEIGHT_COLUMN.to_string(),
        };
        columns.check_distinct()?;
        Ok(columns)
    }

    /// Override the label of negative-outcome rows.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DuplicateDimension` if the label equals
    /// the numerator value.
    pub fn with_negative_label(mut self, label: impl Into<Value>) -> Result<Self, ConfigurationError> {
        self.negative_label = label.into();
        self.check_labels()?;
        Ok(self)
    }

    /// Override the weight column name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DuplicateDimension` if the name collides
    /// with another role.
    pub fn with_weight_column(mut self, column: impl Into<String>) -> Result<Self, ConfigurationError> {
        self.weight_column = column.into();
        self.check_distinct()?;
        Ok(self)
    }

    fn check_labels(&self) -> Result<(), ConfigurationError> {
        if self.negative_label == self.numerator {
            return Err(ConfigurationError::DuplicateDimension {
                dimension: self.outcome.clone(),
            });
        }
        Ok(())
    }

    fn check_distinct(&self) -> Result<(), ConfigurationError> {
        let names = [&self.dim1, &self.dim2, &self.outcome, &self.weight_column];
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ConfigurationError::DuplicateDimension {
                    dimension: (*name).clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn dim1(&self) -> &str {
        &self.dim1
    }

    #[must_use]
    pub fn dim2(&self) -> &str {
        &self.dim2
    }

    #[must_use]
    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    #[must_use]
    pub const fn numerator(&self) -> &Value {
        &self.numerator
    }

    #[must_use]
    pub const fn negative_label(&self) -> &Value {
        &self.negative_label
    }

    #[must_use]
    pub fn weight_column(&self) -> &str {
        &self.weight_column
    }
}

/// Parameters for one dim1 category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryParameters {
    /// The dim1 category.
    pub category: String,
    /// Number of observations in the category.
    pub base_count: f64,
    /// Percentage of the category assigned to the pivot dim2 category.
    pub split_percent: f64,
    /// Positive-outcome percentage per dim2 category.
    pub base_rates: IndexMap<String, f64>,
}

impl CategoryParameters {
    /// Create parameters with no base rates yet.
    #[must_use]
    pub fn new(category: impl Into<String>, base_count: f64, split_percent: f64) -> Self {
        Self {
            category: category.into(),
            base_count,
            split_percent,
            base_rates: IndexMap::new(),
        }
    }

    /// Add the base rate of one (dim1, dim2) cell.
    #[must_use]
    pub fn base_rate(mut self, dim2_category: impl Into<String>, percent: f64) -> Self {
        self.base_rates.insert(dim2_category.into(), percent);
        self
    }

    /// The parameters as input text, for pre-populating a form.
    #[must_use]
    pub fn to_raw(&self) -> RawCategoryInput {
        RawCategoryInput {
            category: self.category.clone(),
            base_count: self.base_count.to_string(),
            split_percent: self.split_percent.to_string(),
            base_rates: self
                .base_rates
                .iter()
                .map(|(cell, rate)| (cell.clone(), rate.to_string()))
                .collect(),
        }
    }
}

/// Raw text of one row of simulation inputs, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCategoryInput {
    pub category: String,
    pub base_count: String,
    pub split_percent: String,
    /// `(dim2 category, base rate text)` pairs.
    pub base_rates: Vec<(String, String)>,
}

/// All inputs of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameterSet {
    /// dim2 category whose share is given by `split_percent`.
    pub pivot: String,
    /// The dim2 categories; valid only with exactly two distinct entries.
    pub split_categories: Vec<String>,
    /// Per-dim1-category parameters, in display order.
    pub categories: Vec<CategoryParameters>,
}

fn parse_number(category: &str, field: &str, input: &str) -> Result<f64, ValidationError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            category: category.to_string(),
            field: field.to_string(),
            input: input.to_string(),
        })
}

fn check_range(category: &str, field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotANumber {
            category: category.to_string(),
            field: field.to_string(),
            input: value.to_string(),
        });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            category: category.to_string(),
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn base_rate_field(cell: &str) -> String {
    format!("base rate ({cell})")
}

impl SimulationParameterSet {
    /// Create a parameter set. Nothing is checked until [`Self::validate`].
    #[must_use]
    pub fn new(
        split_categories: Vec<String>,
        pivot: impl Into<String>,
        categories: Vec<CategoryParameters>,
    ) -> Self {
        Self {
            pivot: pivot.into(),
            split_categories,
            categories,
        }
    }

    /// Parses raw text inputs into a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found; number parsing errors name
    /// the dim1 category of the offending row.
    pub fn parse(
        columns: &SimulationColumns,
        split_categories: Vec<String>,
        pivot: impl Into<String>,
        inputs: &[RawCategoryInput],
    ) -> Result<Self, ValidationError> {
        let mut categories = Vec::with_capacity(inputs.len());
        for input in inputs {
            let category = input.category.as_str();
            let mut parsed = CategoryParameters::new(
                category,
                parse_number(category, FIELD_BASE_COUNT, &input.base_count)?,
                parse_number(category, FIELD_SPLIT, &input.split_percent)?,
            );
            for (cell, text) in &input.base_rates {
                let rate = parse_number(category, &base_rate_field(cell), text)?;
                parsed.base_rates.insert(cell.clone(), rate);
            }
            categories.push(parsed);
        }

        let set = Self::new(split_categories, pivot, categories);
        set.validate(columns)?;
        Ok(set)
    }

    /// The dim2 category that is not the pivot.
    #[must_use]
    pub fn other(&self) -> Option<&str> {
        self.split_categories
            .iter()
            .map(String::as_str)
            .find(|c| *c != self.pivot)
    }

    /// Share (0–1) of a dim1 category assigned to `dim2_category`.
    #[must_use]
    pub fn proportion(&self, params: &CategoryParameters, dim2_category: &str) -> f64 {
        if dim2_category == self.pivot {
            0.01 * params.split_percent
        } else {
            0.01 * (100.0 - params.split_percent)
        }
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// - `SplitCardinality` unless dim2 has exactly two distinct categories
    /// - `UnknownPivot` if the pivot is not one of them
    /// - `NoCategories` when no dim1 category is given
    /// - per-category errors naming the dim1 category: non-finite numbers,
    ///   negative base counts, splits or rates outside `[0, 100]`, missing or
    ///   unexpected base rates, repeated categories
    pub fn validate(&self, columns: &SimulationColumns) -> Result<(), ValidationError> {
        let mut distinct: Vec<&str> = self.split_categories.iter().map(String::as_str).collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != 2 {
            return Err(ValidationError::SplitCardinality {
                dimension: columns.dim2().to_string(),
                found: distinct.len(),
            });
        }
        if !distinct.contains(&self.pivot.as_str()) {
            return Err(ValidationError::UnknownPivot {
                dimension: columns.dim2().to_string(),
                pivot: self.pivot.clone(),
            });
        }
        if self.categories.is_empty() {
            return Err(ValidationError::NoCategories {
                dimension: columns.dim1().to_string(),
            });
        }

        for (i, params) in self.categories.iter().enumerate() {
            let category = params.category.as_str();
            if self.categories[..i].iter().any(|p| p.category == category) {
                return Err(ValidationError::DuplicateCategory {
                    category: category.to_string(),
                });
            }
            check_range(category, FIELD_BASE_COUNT, params.base_count, 0.0, f64::MAX)?;
            check_range(category, FIELD_SPLIT, params.split_percent, 0.0, 100.0)?;
            for cell in &distinct {
                let rate = params
                    .base_rates
                    .get(*cell)
                    .ok_or_else(|| ValidationError::MissingBaseRate {
                        category: category.to_string(),
                        cell: (*cell).to_string(),
                    })?;
                check_range(category, &base_rate_field(cell), *rate, 0.0, 100.0)?;
            }
            if let Some(extra) = params.base_rates.keys().find(|k| !distinct.contains(&k.as_str())) {
                return Err(ValidationError::UnexpectedBaseRate {
                    category: category.to_string(),
                    cell: extra.clone(),
                });
            }
        }
        Ok(())
    }
}
