//! Renderer-agnostic chart descriptors.
//!
//! A [`ChartSpec`] says what to draw (series of points, axis titles, value
//! formatting) without depending on any plotting library. A thin adapter per
//! rendering target turns it into that target's figure object.

use indexmap::IndexMap;
use serde::Serialize;

use crate::aggregation::{AggregateResult, CountResult};
use crate::dataset::{fingerprint_of, CategoryOrders};
use crate::trend::{palette_color, TrendResult, ALL_ROWS};
use crate::value::Value;

/// Suffix appended to rate values and rate-axis ticks.
pub const PERCENT_SUFFIX: &str = "%";

/// Decimal places shown in rate tooltips.
pub const TOOLTIP_PRECISION: usize = 2;

/// Colour of fitted trend lines.
pub const TREND_LINE_COLOR: &str = "black";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One bar per compare value.
    Bar,
    /// Bars grouped by compare value and coloured by facet value.
    GroupedBar,
    /// Scatter points with one fitted line per partition.
    ScatterWithTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Bar,
    Markers,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDash {
    Solid,
    Dot,
}

/// Which points a hover reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverMode {
    /// The nearest point.
    #[default]
    Closest,
    /// Every point sharing the hovered x value.
    X,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: Value,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<Value>,
    pub mark: Mark,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<LineDash>,
    pub show_legend: bool,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTitles {
    pub x: String,
    pub y: String,
}

/// Tooltip text of the form `"<label> = <y><suffix>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub label: String,
    pub precision: usize,
    pub suffix: String,
}

impl Tooltip {
    /// Tooltip for outcome rates.
    #[must_use]
    pub fn rate(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            precision: TOOLTIP_PRECISION,
            suffix: PERCENT_SUFFIX.to_string(),
        }
    }

    /// Renders the tooltip for one value.
    #[must_use]
    pub fn format(&self, y: f64) -> String {
        format!("{} = {:.*}{}", self.label, self.precision, y, self.suffix)
    }
}

/// A complete chart description, produced fresh for every computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub series: Vec<Series>,
    pub axis_titles: AxisTitles,
    /// Ordered x categories (bar charts only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub x_categories: Vec<Value>,
    /// Suffix for the value axis ticks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Tooltip>,
    pub hover_mode: HoverMode,
    /// Column whose values colour the series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    /// Declared display orderings the series were sorted with.
    #[serde(skip_serializing_if = "CategoryOrders::is_empty")]
    pub category_orders: CategoryOrders,
}

impl ChartSpec {
    /// An empty bar chart with the rate axis already titled.
    ///
    /// Shown before the first simulation run.
    #[must_use]
    pub fn empty_rates(x_title: impl Into<String>, rate_label: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::Bar,
            series: Vec::new(),
            axis_titles: AxisTitles {
                x: x_title.into(),
                y: rate_label.into(),
            },
            x_categories: Vec::new(),
            value_suffix: Some(PERCENT_SUFFIX.to_string()),
            tooltip: None,
            hover_mode: HoverMode::X,
            group_key: None,
            legend_title: None,
            category_orders: CategoryOrders::new(),
        }
    }

    /// Attaches the display orderings used to sort the series.
    #[must_use]
    pub fn with_category_orders(mut self, orders: CategoryOrders) -> Self {
        self.category_orders = orders;
        self
    }

    /// Total number of points across series.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    /// Looks up a series by name.
    #[must_use]
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Serializes the descriptor to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Stable content hash; identical inputs give identical fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint_of(self)
    }
}

/// One bar as (compare, facet, y).
struct Bar<'a> {
    compare: &'a Value,
    facet: Option<&'a Value>,
    y: f64,
}

/// Shared layout of rate and count bar charts.
fn bar_chart<'a>(
    compare_dimension: &str,
    facet_dimension: Option<&str>,
    bars: impl Iterator<Item = Bar<'a>>,
    y_title: &str,
) -> ChartSpec {
    let mut x_categories: Vec<Value> = Vec::new();
    let mut by_facet: IndexMap<Option<Value>, Vec<ChartPoint>> = IndexMap::new();
    for bar in bars {
        if !x_categories.contains(bar.compare) {
            x_categories.push(bar.compare.clone());
        }
        by_facet.entry(bar.facet.cloned()).or_default().push(ChartPoint {
            x: bar.compare.clone(),
            y: bar.y,
            group_key: bar.facet.cloned(),
        });
    }

    let grouped = facet_dimension.is_some();
    let series = by_facet
        .into_iter()
        .enumerate()
        .map(|(i, (facet, points))| Series {
            name: facet.as_ref().map_or_else(|| y_title.to_string(), Value::label),
            group_key: facet,
            mark: Mark::Bar,
            color: grouped.then(|| palette_color(i).to_string()),
            dash: None,
            show_legend: grouped,
            points,
        })
        .collect();

    ChartSpec {
        kind: if grouped { ChartKind::GroupedBar } else { ChartKind::Bar },
        series,
        axis_titles: AxisTitles {
            x: compare_dimension.to_string(),
            y: y_title.to_string(),
        },
        x_categories,
        value_suffix: None,
        tooltip: None,
        hover_mode: HoverMode::Closest,
        group_key: facet_dimension.map(str::to_string),
        legend_title: facet_dimension.map(str::to_string),
        category_orders: CategoryOrders::new(),
    }
}

/// Bar chart of outcome rates.
///
/// Groups with an undefined rate are left out of the series; they remain
/// visible in the aggregate's warnings.
#[must_use]
pub fn rate_chart(result: &AggregateResult, rate_label: &str) -> ChartSpec {
    let bars = result.rows.iter().filter_map(|r| {
        r.rate.map(|y| Bar {
            compare: &r.compare_value,
            facet: r.facet_value.as_ref(),
            y,
        })
    });
    let mut chart = bar_chart(
        &result.compare_dimension,
        result.facet_dimension.as_deref(),
        bars,
        rate_label,
    );
    chart.value_suffix = Some(PERCENT_SUFFIX.to_string());
    chart.tooltip = Some(Tooltip::rate(rate_label));
    chart.hover_mode = HoverMode::X;
    chart
}

/// Bar chart of summed weights.
#[must_use]
pub fn count_chart(result: &CountResult, count_label: &str) -> ChartSpec {
    let bars = result.rows.iter().map(|r| Bar {
        compare: &r.compare_value,
        facet: r.facet_value.as_ref(),
        y: r.count,
    });
    bar_chart(
        &result.compare_dimension,
        result.facet_dimension.as_deref(),
        bars,
        count_label,
    )
}

/// Scatter points plus a dotted trend line per fitted partition.
///
/// Partitions without a fit still show their points.
#[must_use]
pub fn trend_chart(result: &TrendResult) -> ChartSpec {
    let grouped = result.group_column.is_some();
    let mut series = Vec::with_capacity(result.partitions.len() * 2);
    for partition in &result.partitions {
        let label = partition.label();
        series.push(Series {
            name: label.clone(),
            group_key: partition.group_key.clone(),
            mark: Mark::Markers,
            color: partition.color.map(str::to_string),
            dash: None,
            show_legend: grouped,
            points: partition
                .points
                .iter()
                .map(|p| ChartPoint {
                    x: Value::from(p.x),
                    y: p.y,
                    group_key: partition.group_key.clone(),
                })
                .collect(),
        });

        if let Ok(line) = &partition.fit {
            series.push(Series {
                name: if grouped { format!("fit_{label}") } else { "fit".to_string() },
                group_key: partition.group_key.clone(),
                mark: Mark::Line,
                color: Some(TREND_LINE_COLOR.to_string()),
                dash: Some(LineDash::Dot),
                show_legend: false,
                points: line
                    .endpoints
                    .iter()
                    .map(|p| ChartPoint {
                        x: Value::from(p.x),
                        y: p.y,
                        group_key: partition.group_key.clone(),
                    })
                    .collect(),
            });
        }
    }

    ChartSpec {
        kind: ChartKind::ScatterWithTrend,
        series,
        axis_titles: AxisTitles {
            x: result.x_column.clone(),
            y: result.y_column.clone(),
        },
        x_categories: Vec::new(),
        value_suffix: None,
        tooltip: None,
        hover_mode: HoverMode::Closest,
        group_key: result.group_column.clone(),
        legend_title: Some(
            result
                .group_column
                .clone()
                .unwrap_or_else(|| ALL_ROWS.to_string()),
        ),
        category_orders: CategoryOrders::new(),
    }
}
