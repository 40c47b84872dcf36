//! Linear trends for the continuous-variable view.
//!
//! One ordinary least-squares line is fitted per partition. A partition that
//! cannot be fitted carries its own [`InsufficientDataError`] while the other
//! partitions still render.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregation::Facet;
use crate::dataset::Dataset;
use crate::error::{ConfigurationError, InsufficientDataError};
use crate::value::Value;

/// Colours assigned to partitions, reused cyclically.
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Partition label used when rows are not grouped.
pub const ALL_ROWS: &str = "all rows";

/// Palette colour for the partition at `index`.
#[must_use]
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub x: f64,
    pub y: f64,
}

/// A fitted line and the two points used to draw it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub intercept: f64,
    pub slope: f64,
    /// Predictions at the smallest and largest x.
    pub endpoints: [TrendPoint; 2],
}

impl TrendLine {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fits `y = intercept + slope * x` by ordinary least squares.
///
/// # Errors
///
/// Returns `InsufficientDataError` when fewer than two distinct x values are
/// present; `partition` names the data in the error.
pub fn fit_line(points: &[TrendPoint], partition: &str) -> Result<TrendLine, InsufficientDataError> {
    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    if xs.len() < 2 {
        return Err(InsufficientDataError {
            partition: partition.to_string(),
            distinct_x: xs.len(),
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for p in points {
        let dx = p.x - mean_x;
        sxx += dx * dx;
        sxy += dx * (p.y - mean_y);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let (min_x, max_x) = (xs[0], xs[xs.len() - 1]);
    Ok(TrendLine {
        intercept,
        slope,
        endpoints: [
            TrendPoint {
                x: min_x,
                y: intercept + slope * min_x,
            },
            TrendPoint {
                x: max_x,
                y: intercept + slope * max_x,
            },
        ],
    })
}

/// Scatter points and fitted line for one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPartition {
    /// Group value; `None` when rows are not grouped.
    pub group_key: Option<Value>,
    /// Palette colour; `None` when rows are not grouped.
    pub color: Option<&'static str>,
    pub points: Vec<TrendPoint>,
    pub fit: Result<TrendLine, InsufficientDataError>,
}

impl TrendPartition {
    /// Legend label for the partition.
    #[must_use]
    pub fn label(&self) -> String {
        self.group_key
            .as_ref()
            .map_or_else(|| ALL_ROWS.to_string(), Value::label)
    }
}

/// Result of [`fit_trend`]: partitions in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendResult {
    pub x_column: String,
    pub y_column: String,
    pub group_column: Option<String>,
    pub partitions: Vec<TrendPartition>,
}

impl TrendResult {
    /// Partitions whose line could be fitted.
    pub fn fitted(&self) -> impl Iterator<Item = (&TrendPartition, &TrendLine)> {
        self.partitions
            .iter()
            .filter_map(|p| p.fit.as_ref().ok().map(|line| (p, line)))
    }

    /// Errors of the partitions that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &InsufficientDataError> {
        self.partitions.iter().filter_map(|p| p.fit.as_ref().err())
    }
}

/// Fits one trend line over all rows, or one per group value.
///
/// Groups appear in the order their value is first seen in the dataset and
/// are coloured from [`PALETTE`] by that position.
///
/// # Errors
///
/// Returns a `ConfigurationError` if a column is missing, if x or y hold
/// non-numeric values, or if the group column is x or y.
pub fn fit_trend(
    dataset: &Dataset,
    x_column: &str,
    y_column: &str,
    group: &Facet,
) -> Result<TrendResult, ConfigurationError> {
    let xs = dataset.numeric_column(x_column)?;
    let ys = dataset.numeric_column(y_column)?;

    let partitions = match group.as_dimension() {
        None => {
            let points: Vec<TrendPoint> = xs.iter().zip(&ys).map(|(&x, &y)| TrendPoint { x, y }).collect();
            let fit = fit_line(&points, ALL_ROWS);
            vec![TrendPartition {
                group_key: None,
                color: None,
                points,
                fit,
            }]
        }
        Some(column) => {
            if column == x_column || column == y_column {
                return Err(ConfigurationError::DuplicateDimension {
                    dimension: column.to_string(),
                });
            }
            let mut grouped: IndexMap<Value, Vec<TrendPoint>> = IndexMap::new();
            for ((key, &x), &y) in dataset.column(column)?.zip(&xs).zip(&ys) {
                grouped.entry(key.clone()).or_default().push(TrendPoint { x, y });
            }
            grouped
                .into_iter()
                .enumerate()
                .map(|(i, (key, points))| {
                    let fit = fit_line(&points, &key.label());
                    TrendPartition {
                        group_key: Some(key),
                        color: Some(palette_color(i)),
                        points,
                        fit,
                    }
                })
                .collect()
        }
    };

    let result = TrendResult {
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        group_column: group.as_dimension().map(str::to_string),
        partitions,
    };
    for err in result.skipped() {
        warn!(x = x_column, y = y_column, "{err}");
    }
    debug!(
        x = x_column,
        y = y_column,
        group = group.selection(),
        partitions = result.partitions.len(),
        "fitted trends"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scatter() -> Dataset {
        let mut b = Dataset::builder(["hours", "score", "class"]);
        // Within each class the score rises with hours; across classes it falls.
        for (class, offset) in [("a", 0.0), ("b", 10.0), ("c", 20.0)] {
            for step in 0..4 {
                let x = offset + f64::from(step);
                let y = 100.0 - 3.0 * offset + 2.0 * f64::from(step);
                b = b.row([Value::from(x), Value::from(y), Value::from(class)]);
            }
        }
        b.build().unwrap()
    }

    #[test]
    fn fit_line_exact() {
        let points: Vec<TrendPoint> = (0..5)
            .map(|i| {
                let x = f64::from(i);
                TrendPoint { x, y: 1.5 + 0.5 * x }
            })
            .collect();
        let line = fit_line(&points, ALL_ROWS).unwrap();
        assert!((line.slope - 0.5).abs() < 1e-12);
        assert!((line.intercept - 1.5).abs() < 1e-12);
        assert!((line.endpoints[0].x - 0.0).abs() < f64::EPSILON);
        assert!((line.endpoints[1].x - 4.0).abs() < f64::EPSILON);
        assert!((line.endpoints[1].y - 3.5).abs() < 1e-12);
        assert!((line.predict(2.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn fit_line_needs_two_distinct_x() {
        let points = vec![TrendPoint { x: 1.0, y: 2.0 }, TrendPoint { x: 1.0, y: 5.0 }];
        let err = fit_line(&points, "g").unwrap_err();
        assert_eq!(err.distinct_x, 1);
        assert_eq!(err.partition, "g");
        assert_eq!(fit_line(&[], "g").unwrap_err().distinct_x, 0);
    }

    #[test]
    fn ungrouped_trend_is_negative() {
        let result = fit_trend(&scatter(), "hours", "score", &Facet::None).unwrap();
        assert_eq!(result.partitions.len(), 1);
        let p = &result.partitions[0];
        assert_eq!(p.group_key, None);
        assert_eq!(p.color, None);
        assert_eq!(p.points.len(), 12);
        assert!(p.fit.as_ref().unwrap().slope < 0.0);
    }

    #[test]
    fn grouped_trends_reverse_direction() {
        let result = fit_trend(&scatter(), "hours", "score", &Facet::Dimension("class".into())).unwrap();
        let labels: Vec<String> = result.partitions.iter().map(TrendPartition::label).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        for (i, (p, line)) in result.fitted().enumerate() {
            assert_eq!(p.color, Some(PALETTE[i]));
            assert!((line.slope - 2.0).abs() < 1e-9);
        }
        assert_eq!(result.skipped().count(), 0);
    }

    #[test]
    fn degenerate_partition_is_skipped_alone() {
        let data = Dataset::builder(["x", "y", "g"])
            .row([Value::from(1.0), Value::from(1.0), Value::from("solo")])
            .row([Value::from(0.0), Value::from(0.0), Value::from("pair")])
            .row([Value::from(1.0), Value::from(2.0), Value::from("pair")])
            .build()
            .unwrap();
        let result = fit_trend(&data, "x", "y", &Facet::Dimension("g".into())).unwrap();
        assert_eq!(result.partitions.len(), 2);
        assert!(result.partitions[0].fit.is_err());
        assert_eq!(result.partitions[0].label(), "solo");
        let (p, line) = result.fitted().next().unwrap();
        assert_eq!(p.label(), "pair");
        assert!((line.slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), palette_color(10));
        assert_eq!(palette_color(3), palette_color(23));
        assert_ne!(palette_color(0), palette_color(1));
    }

    #[test]
    fn non_numeric_axis_is_configuration_error() {
        let err = fit_trend(&scatter(), "class", "score", &Facet::None).unwrap_err();
        assert!(matches!(err, ConfigurationError::NonNumericValue { .. }));
    }

    #[test]
    fn group_on_axis_column_is_rejected() {
        let err = fit_trend(&scatter(), "hours", "score", &Facet::Dimension("hours".into())).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateDimension { .. }));
    }
}
