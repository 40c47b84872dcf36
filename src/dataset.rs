//! Tabular datasets and the dimensions derived from them.
//!
//! A [`Dataset`] is an ordered sequence of rows over a fixed set of columns.
//! Rows are either individual observations or pre-aggregated count records;
//! when a weight column is designated its value is the row's count, otherwise
//! every row counts once.
//!
//! Datasets are never mutated by the engines. They are built once (by a
//! loader outside this crate, or by the simulation engine) and then shared
//! read-only.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::value::Value;

/// Per-column display orderings, keyed by column name.
///
/// Listed values are shown first in the listed order; values that are not
/// listed follow in ascending order.
pub type CategoryOrders = BTreeMap<String, Vec<String>>;

/// An immutable table of rows with an optional weight column.
///
/// # Examples
///
/// ```
/// use simpsons::{Dataset, Value};
///
/// let data = Dataset::builder(["dept", "accepted", "N"])
///     .weight_column("N")
///     .row(["A".into(), "yes".into(), Value::from(90.0)])
///     .row(["A".into(), "no".into(), Value::from(10.0)])
///     .build()
///     .unwrap();
///
/// assert_eq!(data.len(), 2);
/// assert!((data.total_weight() - 100.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    weight_column: Option<String>,
    #[serde(skip)]
    weight_index: Option<usize>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Starts building a dataset over the given columns.
    pub fn builder<I, S>(columns: I) -> DatasetBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DatasetBuilder::new(columns)
    }

    /// Builds a dataset from a JSON array of flat objects.
    ///
    /// Column order follows the first record's keys; every record must carry
    /// exactly the same keys. Cells must be strings or numbers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidRecords` for malformed records and
    /// the usual builder errors for bad weights.
    pub fn from_json_records(
        records: &serde_json::Value,
        weight_column: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let serde_json::Value::Array(items) = records else {
            return Err(ConfigurationError::InvalidRecords {
                reason: "expected a JSON array of records".to_string(),
            });
        };

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(items.len());
        for (row, item) in items.iter().enumerate() {
            let serde_json::Value::Object(fields) = item else {
                return Err(ConfigurationError::InvalidRecords {
                    reason: format!("record {row} is not an object"),
                });
            };
            if row == 0 {
                columns = fields.keys().cloned().collect();
            } else if fields.len() != columns.len() {
                return Err(ConfigurationError::RowArity {
                    row,
                    actual: fields.len(),
                    expected: columns.len(),
                });
            }

            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = fields.get(column).ok_or_else(|| ConfigurationError::InvalidRecords {
                    reason: format!("record {row} has no '{column}' field"),
                })?;
                let value = serde_json::from_value::<Value>(cell.clone()).map_err(|_| {
                    ConfigurationError::InvalidRecords {
                        reason: format!("record {row} field '{column}' is neither text nor a number"),
                    }
                })?;
                values.push(value);
            }
            rows.push(values);
        }

        let mut builder = DatasetBuilder::new(columns);
        if let Some(weight) = weight_column {
            builder = builder.weight_column(weight);
        }
        builder.rows = rows;
        builder.build()
    }

    /// Assembles a dataset whose rows are already known to be well formed.
    pub(crate) fn from_validated_rows(
        columns: Vec<String>,
        weight_column: Option<String>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let weight_index = weight_column
            .as_ref()
            .and_then(|w| columns.iter().position(|c| c == w));
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            columns,
            weight_column,
            weight_index,
            rows,
        }
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The designated weight column, if any.
    #[must_use]
    pub fn weight_column(&self) -> Option<&str> {
        self.weight_column.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of a column.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingColumn` if the column is absent.
    pub fn column_index(&self, name: &str) -> Result<usize, ConfigurationError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ConfigurationError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| Row {
            dataset: self,
            index,
        })
    }

    /// Weight of a single row (1 when no weight column is designated).
    #[must_use]
    pub fn weight(&self, row: usize) -> f64 {
        match self.weight_index {
            Some(w) => self.rows[row][w].as_number().unwrap_or(0.0),
            None => 1.0,
        }
    }

    /// Total observed count: the sum of all row weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        (0..self.rows.len()).map(|row| self.weight(row)).sum()
    }

    /// Cells of one column, in row order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingColumn` if the column is absent.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_, ConfigurationError> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r[index]))
    }

    /// Cells of one column as numbers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NonNumericValue` at the first categorical
    /// cell.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, ConfigurationError> {
        self.column(name)?
            .enumerate()
            .map(|(row, v)| {
                v.as_number().ok_or_else(|| ConfigurationError::NonNumericValue {
                    column: name.to_string(),
                    row,
                    value: v.to_string(),
                })
            })
            .collect()
    }

    /// Derives a dimension (distinct values in first-seen order).
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingColumn` if the column is absent.
    pub fn dimension(&self, name: &str) -> Result<Dimension, ConfigurationError> {
        let values: IndexSet<Value> = self.column(name)?.cloned().collect();
        Ok(Dimension {
            name: name.to_string(),
            values: values.into_iter().collect(),
            display_order: None,
        })
    }

    /// Stable content hash (blake3 over the canonical JSON form).
    ///
    /// Two datasets with equal columns, weight column and rows always share a
    /// fingerprint, which makes "the engine did not touch its input" cheap to
    /// check.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint_of(self)
    }
}

/// Hex blake3 digest of a value's JSON serialization.
pub(crate) fn fingerprint_of<T: Serialize>(value: &T) -> String {
    let mut hasher = blake3::Hasher::new();
    // Serializing plain data structures into a Vec cannot fail.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hasher.update(&bytes);
    hasher.finalize().to_hex().to_string()
}

/// Borrowed view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> Row<'a> {
    /// Row position in the dataset.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let i = self.dataset.columns.iter().position(|c| c == column)?;
        Some(&self.dataset.rows[self.index][i])
    }

    /// Cell by column position.
    #[must_use]
    pub fn at(&self, column: usize) -> &'a Value {
        &self.dataset.rows[self.index][column]
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.dataset.weight(self.index)
    }
}

/// Builder for [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    columns: Vec<String>,
    weight_column: Option<String>,
    rows: Vec<Vec<Value>>,
}

impl DatasetBuilder {
    /// Create a new builder over the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            weight_column: None,
            rows: Vec::new(),
        }
    }

    /// Designate the weight (count) column.
    #[must_use]
    pub fn weight_column(mut self, column: impl Into<String>) -> Self {
        self.weight_column = Some(column.into());
        self
    }

    /// Append one row; values are positional.
    #[must_use]
    pub fn row<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.rows.push(values.into_iter().collect());
        self
    }

    /// Append one row in place.
    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(values);
    }

    /// Build the dataset.
    ///
    /// # Errors
    ///
    /// - `DuplicateColumn` if a column name repeats
    /// - `MissingColumn` if the weight column is not a column
    /// - `RowArity` if a row has the wrong number of values
    /// - `InvalidWeight` for negative, non-finite or categorical weights
    pub fn build(self) -> Result<Dataset, ConfigurationError> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(column) {
                return Err(ConfigurationError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        let weight_index = match &self.weight_column {
            Some(name) => Some(self.columns.iter().position(|c| c == name).ok_or_else(|| {
                ConfigurationError::MissingColumn {
                    column: name.clone(),
                }
            })?),
            None => None,
        };

        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != self.columns.len() {
                return Err(ConfigurationError::RowArity {
                    row,
                    actual: values.len(),
                    expected: self.columns.len(),
                });
            }
            if let Some(w) = weight_index {
                let valid = values[w]
                    .as_number()
                    .is_some_and(|n| n.is_finite() && n >= 0.0);
                if !valid {
                    return Err(ConfigurationError::InvalidWeight {
                        row,
                        value: values[w].to_string(),
                    });
                }
            }
        }

        Ok(Dataset {
            columns: self.columns,
            weight_column: self.weight_column,
            weight_index,
            rows: self.rows,
        })
    }
}

/// A categorical column and its distinct values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Column name.
    pub name: String,
    /// Distinct values in first-seen order.
    pub values: Vec<Value>,
    /// Optional declared display ordering (by label).
    pub display_order: Option<Vec<String>>,
}

impl Dimension {
    /// Attach a declared display ordering.
    #[must_use]
    pub fn with_display_order(mut self, order: Vec<String>) -> Self {
        self.display_order = Some(order);
        self
    }

    /// Number of distinct values.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    /// Distinct values in ascending order.
    #[must_use]
    pub fn sorted_values(&self) -> Vec<Value> {
        let mut values = self.values.clone();
        values.sort();
        values
    }

    /// Distinct values in display order: declared ones first, the rest
    /// ascending.
    #[must_use]
    pub fn display_values(&self) -> Vec<Value> {
        let mut values = self.values.clone();
        values.sort_by(|a, b| display_cmp(self.display_order.as_deref(), a, b));
        values
    }
}

/// Compares two values of the same column for display.
pub(crate) fn display_cmp(order: Option<&[String]>, a: &Value, b: &Value) -> Ordering {
    let Some(order) = order else {
        return a.cmp(b);
    };
    let rank = |v: &Value| {
        let label = v.label();
        order.iter().position(|o| *o == label)
    };
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
