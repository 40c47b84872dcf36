//! Per-dataset explorer settings.
//!
//! An [`ExplorerConfig`] names the columns each view works with and the
//! labels it shows. It is deserialized from JSON and checked once with
//! [`ExplorerConfig::validate`]; [`ExplorerConfig::validate_against`] then
//! checks it against the dataset it will be used with.

use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregationRequest, Facet};
use crate::dataset::{CategoryOrders, Dataset};
use crate::error::ConfigurationError;
use crate::simulation::{SimulationColumns, DEFAULT_NEGATIVE_LABEL, DEFAULT_WEIGHT_COLUMN};
use crate::value::Value;

/// Count label used when none is configured.
pub const DEFAULT_COUNT_LABEL: &str = "Count";

fn default_weight_column() -> String {
    DEFAULT_WEIGHT_COLUMN.to_string()
}

fn default_count_label() -> String {
    DEFAULT_COUNT_LABEL.to_string()
}

fn default_negative_label() -> Value {
    Value::from(DEFAULT_NEGATIVE_LABEL)
}

/// Settings for one explorable dataset.
///
/// Only the settings a view needs are required by that view; a dataset used
/// just for the continuous view never needs an outcome column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub title: String,
    /// The question the dataset is meant to answer.
    #[serde(default)]
    pub question: String,
    #[serde(default = "default_weight_column")]
    pub weight_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_numerator: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_rate_label: Option<String>,
    #[serde(default = "default_count_label")]
    pub input_count_label: String,
    /// Compare column selected when the categorical view opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_variable: Option<String>,
    #[serde(default)]
    pub category_orders: CategoryOrders,
    /// `[dim1, dim2]` for the simulation view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulate_categories: Option<Vec<String>>,
    /// `[x, y]` for the continuous view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous_cols: Option<Vec<String>>,
    #[serde(default = "default_negative_label")]
    pub negative_label: Value,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            question: String::new(),
            weight_column: default_weight_column(),
            outcome: None,
            outcome_numerator: None,
            outcome_rate_label: None,
            input_count_label: default_count_label(),
            initial_variable: None,
            category_orders: CategoryOrders::new(),
            simulate_categories: None,
            continuous_cols: None,
            negative_label: default_negative_label(),
        }
    }
}

fn missing(setting: &str) -> ConfigurationError {
    ConfigurationError::MissingSetting {
        setting: setting.to_string(),
    }
}

fn invalid(setting: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        setting: setting.to_string(),
        reason: reason.into(),
    }
}

/// Checks a setting that must name exactly two distinct columns.
fn column_pair<'a>(setting: &str, columns: Option<&'a [String]>) -> Result<(&'a str, &'a str), ConfigurationError> {
    match columns.ok_or_else(|| missing(setting))? {
        [a, b] if a == b => Err(invalid(setting, format!("'{a}' is listed twice"))),
        [a, b] => Ok((a.as_str(), b.as_str())),
        other => Err(invalid(setting, format!("expected 2 columns, found {}", other.len()))),
    }
}

impl ExplorerConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSetting` for malformed JSON and
    /// whatever [`validate`](Self::validate) rejects.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_value(json.clone()).map_err(|e| invalid("config", e.to_string()))?;
        config.validate()
    }

    /// Checks the settings for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a column pair is malformed, the weight
    /// column is empty or doubles as the outcome, or the negative label equals
    /// the numerator.
    pub fn validate(self) -> Result<Self, ConfigurationError> {
        if self.weight_column.is_empty() {
            return Err(invalid("weight_column", "must not be empty"));
        }
        if self.outcome.as_deref() == Some(self.weight_column.as_str()) {
            return Err(ConfigurationError::WeightColumnAsDimension {
                column: self.weight_column,
            });
        }
        if self.simulate_categories.is_some() {
            column_pair("simulate_categories", self.simulate_categories.as_deref())?;
        }
        if self.continuous_cols.is_some() {
            column_pair("continuous_cols", self.continuous_cols.as_deref())?;
        }
        if self.outcome_numerator.as_ref() == Some(&self.negative_label) {
            return Err(invalid(
                "negative_label",
                format!("must differ from the outcome numerator {}", self.negative_label),
            ));
        }
        Ok(self)
    }

    /// Checks that every configured column exists in `dataset`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingColumn` for the first absent column.
    pub fn validate_against(&self, dataset: &Dataset) -> Result<(), ConfigurationError> {
        let named = self
            .outcome
            .iter()
            .chain(self.initial_variable.iter())
            .chain(self.simulate_categories.iter().flatten())
            .chain(self.continuous_cols.iter().flatten());
        for column in named {
            dataset.column_index(column)?;
        }
        if let Some(orders) = self.category_orders.keys().find(|c| !dataset.has_column(c)) {
            return Err(ConfigurationError::MissingColumn {
                column: orders.clone(),
            });
        }
        Ok(())
    }

    /// Builds a dataset from JSON records using the configured weight column.
    ///
    /// Records without that column are unweighted.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Dataset::from_json_records`] rejects.
    pub fn load_dataset(&self, records: &serde_json::Value) -> Result<Dataset, ConfigurationError> {
        let weighted = records
            .as_array()
            .and_then(|items| items.first())
            .and_then(serde_json::Value::as_object)
            .is_some_and(|first| first.contains_key(&self.weight_column));
        Dataset::from_json_records(records, weighted.then_some(self.weight_column.as_str()))
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingSetting` if no outcome is set.
    pub fn outcome(&self) -> Result<&str, ConfigurationError> {
        self.outcome.as_deref().ok_or_else(|| missing("outcome"))
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingSetting` if no numerator is set.
    pub fn outcome_numerator(&self) -> Result<&Value, ConfigurationError> {
        self.outcome_numerator
            .as_ref()
            .ok_or_else(|| missing("outcome_numerator"))
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingSetting` if no rate label is set.
    pub fn rate_label(&self) -> Result<&str, ConfigurationError> {
        self.outcome_rate_label
            .as_deref()
            .ok_or_else(|| missing("outcome_rate_label"))
    }

    /// The `(x, y)` columns of the continuous view.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` unless exactly two distinct columns are set.
    pub fn continuous_pair(&self) -> Result<(&str, &str), ConfigurationError> {
        column_pair("continuous_cols", self.continuous_cols.as_deref())
    }

    /// Columns offered as the compare dimension: everything except the
    /// weight and outcome columns.
    #[must_use]
    pub fn compare_options(&self, dataset: &Dataset) -> Vec<String> {
        dataset
            .columns()
            .iter()
            .filter(|c| **c != self.weight_column && Some(c.as_str()) != self.outcome.as_deref())
            .cloned()
            .collect()
    }

    /// The compare column the categorical view opens with.
    ///
    /// Falls back to the first compare option when no initial variable is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingSetting` if the dataset offers no
    /// compare option at all.
    pub fn initial_compare(&self, dataset: &Dataset) -> Result<String, ConfigurationError> {
        match &self.initial_variable {
            Some(column) => Ok(column.clone()),
            None => self
                .compare_options(dataset)
                .into_iter()
                .next()
                .ok_or_else(|| missing("initial_variable")),
        }
    }

    /// Builds the outcome-rate request for a compare/facet selection.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the outcome settings are missing or the
    /// selection is inconsistent.
    pub fn aggregation_request(
        &self,
        compare: &str,
        facet_selection: &str,
    ) -> Result<AggregationRequest, ConfigurationError> {
        AggregationRequest::builder()
            .compare(compare)
            .facet(Facet::from_selection(facet_selection))
            .outcome(self.outcome()?)
            .numerator(self.outcome_numerator()?.clone())
            .category_orders(self.category_orders.clone())
            .build()
    }

    /// Column roles of the simulation view.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `simulate_categories` or the outcome
    /// settings are missing or malformed.
    pub fn simulation_columns(&self) -> Result<SimulationColumns, ConfigurationError> {
        let (dim1, dim2) = column_pair("simulate_categories", self.simulate_categories.as_deref())?;
        SimulationColumns::new(dim1, dim2, self.outcome()?, self.outcome_numerator()?.clone())?
            .with_negative_label(self.negative_label.clone())?
            .with_weight_column(self.weight_column.clone())
    }
}
