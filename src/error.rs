//! Error types for the Simpson's Paradox engine.
//!
//! All errors are strongly typed using thiserror so callers can tell a
//! fatal configuration problem apart from a recoverable parameter mistake.
//!
//! - [`ConfigurationError`]: the dataset or the request names columns that
//!   cannot be used. Fatal to the current view.
//! - [`ValidationError`]: simulation parameters are malformed. Recoverable;
//!   the caller keeps its last good chart.
//! - [`InsufficientDataError`]: a single trend partition cannot be fitted.
//!   Only that partition is skipped.

use serde::Serialize;
use thiserror::Error;

/// Errors caused by unusable dimension, column, or dataset configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Column '{column}' is not present in the dataset")]
    MissingColumn {
        column: String,
    },

    #[error("Dimension '{dimension}' is used more than once in the request")]
    DuplicateDimension {
        dimension: String,
    },

    #[error("Weight column '{column}' cannot be used as a grouping dimension")]
    WeightColumnAsDimension {
        column: String,
    },

    #[error("Outcome value {value:?} is never observed in column '{column}'")]
    UnknownOutcomeValue {
        column: String,
        value: String,
    },

    #[error("Row {row} has {actual} values, expected {expected}")]
    RowArity {
        row: usize,
        actual: usize,
        expected: usize,
    },

    #[error("Row {row} has invalid weight {value} (weights must be finite and non-negative)")]
    InvalidWeight {
        row: usize,
        value: String,
    },

    #[error("Column '{column}' holds non-numeric value {value} at row {row}")]
    NonNumericValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Duplicate column name '{column}'")]
    DuplicateColumn {
        column: String,
    },

    #[error("Invalid dataset records: {reason}")]
    InvalidRecords {
        reason: String,
    },

    #[error("Required setting '{setting}' is missing or malformed")]
    MissingSetting {
        setting: String,
    },

    #[error("Setting '{setting}' is invalid: {reason}")]
    InvalidSetting {
        setting: String,
        reason: String,
    },

    #[error("No dataset is registered under '{config_id}'")]
    UnknownConfig {
        config_id: String,
    },

    #[error("A dataset is already registered under '{config_id}'")]
    DuplicateConfig {
        config_id: String,
    },

    #[error("Registry unavailable: {reason}")]
    RegistryUnavailable {
        reason: String,
    },
}

/// Errors raised while validating simulation parameters.
///
/// Every variant that concerns a single dim1 category names it, so the UI can
/// point at the offending row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Sim parameter error for: {category}. {field} {input:?} is not a number")]
    NotANumber {
        category: String,
        field: String,
        input: String,
    },

    #[error("Sim parameter error for: {category}. {field} {value} is out of range [{min}, {max}]")]
    OutOfRange {
        category: String,
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Sim parameter error for: {category}. No base rate for '{cell}'")]
    MissingBaseRate {
        category: String,
        cell: String,
    },

    #[error("Sim parameter error for: {category}. Unknown category '{cell}' in base rates")]
    UnexpectedBaseRate {
        category: String,
        cell: String,
    },

    #[error("Sim parameter error for: {category}. Category is listed more than once")]
    DuplicateCategory {
        category: String,
    },

    #[error("Dimension '{dimension}' must have exactly 2 categories, found {found}")]
    SplitCardinality {
        dimension: String,
        found: usize,
    },

    #[error("Pivot category '{pivot}' is not one of the '{dimension}' categories")]
    UnknownPivot {
        dimension: String,
        pivot: String,
    },

    #[error("At least one '{dimension}' category is required")]
    NoCategories {
        dimension: String,
    },
}

impl ValidationError {
    /// The dim1 category this error is about, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::NotANumber { category, .. }
            | Self::OutOfRange { category, .. }
            | Self::MissingBaseRate { category, .. }
            | Self::UnexpectedBaseRate { category, .. }
            | Self::DuplicateCategory { category } => Some(category),
            Self::SplitCardinality { .. } | Self::UnknownPivot { .. } | Self::NoCategories { .. } => {
                None
            }
        }
    }

    /// Short inline message for display next to the simulate button.
    #[must_use]
    pub fn inline_message(&self) -> String {
        match self.category() {
            Some(category) => format!("Sim parameter error for: {category}."),
            None => self.to_string(),
        }
    }
}

/// A trend partition that cannot be fitted with a straight line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Cannot fit a trend for {partition}: {distinct_x} distinct x value(s), at least 2 required")]
pub struct InsufficientDataError {
    /// Display label of the partition (`"all rows"` when ungrouped).
    pub partition: String,
    /// Number of distinct x values found in the partition.
    pub distinct_x: usize,
}

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimpsonsError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Insufficient data: {0}")]
    InsufficientData(#[from] InsufficientDataError),
}

impl SimpsonsError {
    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an insufficient-data error.
    #[must_use]
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData(_))
    }

    /// Returns true if the view can keep showing its previous chart.
    ///
    /// Configuration errors make the whole view unusable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_configuration()
    }
}

/// Result type alias for engine operations.
pub type SimpsonsResult<T> = Result<T, SimpsonsError>;
