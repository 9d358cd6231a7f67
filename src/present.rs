//! Presentation layer: turns aggregated and filtered data into renderable
//! chart specifications, summary metrics and a table view.  Nothing here
//! depends on the UI toolkit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ChartConfig, MetricConfig};
use crate::data::aggregate::{aggregate, summarize, AggregateTable};
use crate::data::model::{Dataset, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Bars per x category, grouped side by side by the colour dimension.
    Bar,
    /// One marker per aggregated row, radius from the size encoding.
    Scatter,
}

// ---------------------------------------------------------------------------
// ChartSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: Value,
    pub y: f64,
    pub size: Option<f64>,
}

/// Points sharing one colour value.  `name` is `None` without a colour encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: Option<Value>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub labels: BTreeMap<String, String>,
    /// The aggregated rows the chart is drawn from.
    pub data: AggregateTable,
}

impl ChartSpec {
    /// Aggregate `filtered` as the chart asks and bind the encodings.
    pub fn build(config: &ChartConfig, filtered: &Dataset) -> Self {
        ChartSpec {
            title: config.title.clone(),
            kind: config.kind,
            x: config.x.clone(),
            y: config.y.clone(),
            color: config.color.clone(),
            size: config.size.clone(),
            labels: config.labels.clone(),
            data: aggregate(filtered, &config.group_by, &config.reductions),
        }
    }

    /// Display label of a column, falling back to the column name.
    pub fn label<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.get(column).map(String::as_str).unwrap_or(column)
    }

    pub fn x_label(&self) -> &str {
        self.label(&self.x)
    }

    pub fn y_label(&self) -> &str {
        self.label(&self.y)
    }

    pub fn legend_title(&self) -> Option<&str> {
        self.color.as_deref().map(|c| self.label(c))
    }

    /// Distinct x values in table order (i.e. sorted for key columns).
    pub fn categories(&self) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::new();
        for v in self.data.column(&self.x).unwrap_or_default() {
            if !out.contains(v) {
                out.push(v.clone());
            }
        }
        out
    }

    /// Split the rows into one series per colour value.  Rows with a null
    /// y value are not drawn.
    pub fn series(&self) -> Vec<Series> {
        let xs = self.data.column(&self.x).unwrap_or_default();
        let ys = self.data.column(&self.y).unwrap_or_default();
        let colors = self.color.as_deref().and_then(|c| self.data.column(c));
        let sizes = self.size.as_deref().and_then(|c| self.data.column(c));

        let mut grouped: BTreeMap<Option<Value>, Vec<Point>> = BTreeMap::new();
        for (i, (x, y)) in xs.into_iter().zip(ys).enumerate() {
            let Some(y) = y.as_f64() else {
                continue;
            };
            let name = colors.as_ref().map(|c| c[i].clone());
            let size = sizes.as_ref().and_then(|s| s[i].as_f64());
            grouped.entry(name).or_default().push(Point {
                x: x.clone(),
                y,
                size,
            });
        }

        grouped
            .into_iter()
            .map(|(name, points)| Series { name, points })
            .collect()
    }

    /// Largest size value, used to scale marker radii.
    pub fn max_size(&self) -> Option<f64> {
        self.series()
            .iter()
            .flat_map(|s| s.points.iter().filter_map(|p| p.size))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: Value,
    pub prefix: Option<String>,
}

impl Metric {
    pub fn build(config: &MetricConfig, filtered: &Dataset) -> Self {
        Metric {
            label: config.label.clone(),
            value: summarize(filtered, &config.reduction),
            prefix: config.prefix.clone(),
        }
    }

    /// Formatted value: integers as-is, floats with two decimals.
    pub fn display(&self) -> String {
        let prefix = self.prefix.as_deref().unwrap_or("");
        match &self.value {
            Value::Float(v) => format!("{prefix}{v:.2}"),
            Value::Null => "–".to_string(),
            other => format!("{prefix}{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// TableView
// ---------------------------------------------------------------------------

/// Filtered rows formatted for display; nulls render as empty cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let rows = dataset
            .rows
            .iter()
            .map(|row| {
                dataset
                    .column_names
                    .iter()
                    .map(|c| match Dataset::cell(row, c) {
                        Value::Null => String::new(),
                        v => v.to_string(),
                    })
                    .collect()
            })
            .collect();
        TableView {
            columns: dataset.column_names.clone(),
            rows,
        }
    }
}

/// Everything drawn for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub charts: Vec<ChartSpec>,
    pub metrics: Vec<Metric>,
    pub table: TableView,
    /// Rows that passed the filters.
    pub row_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::{AggOp, Reduction};
    use crate::data::model::Row;

    fn dataset() -> Dataset {
        let rows = [("CA", "M", 10), ("CA", "F", 20), ("NY", "M", 5), ("CA", "M", 1)]
            .into_iter()
            .map(|(state, gender, births)| {
                [
                    ("state".to_string(), Value::from(state)),
                    ("gender".to_string(), Value::from(gender)),
                    ("births".to_string(), Value::Integer(births)),
                ]
                .into_iter()
                .collect::<Row>()
            })
            .collect();
        Dataset::new(vec!["state".into(), "gender".into(), "births".into()], rows)
    }

    fn bar_config() -> ChartConfig {
        ChartConfig {
            title: "Births".into(),
            kind: ChartKind::Bar,
            group_by: vec!["state".into(), "gender".into()],
            reductions: vec![Reduction::new("births", AggOp::Sum)],
            x: "state".into(),
            y: "births".into(),
            color: Some("gender".into()),
            size: None,
            labels: [("state".to_string(), "State".to_string())].into_iter().collect(),
        }
    }

    #[test]
    fn bar_series_split_by_colour() {
        let chart = ChartSpec::build(&bar_config(), &dataset());
        assert_eq!(chart.categories(), vec![Value::from("CA"), Value::from("NY")]);
        let series = chart.series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, Some(Value::from("F")));
        assert_eq!(series[0].points, vec![Point { x: Value::from("CA"), y: 20.0, size: None }]);
        assert_eq!(series[1].name, Some(Value::from("M")));
        let ys: Vec<f64> = series[1].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![11.0, 5.0]);
        assert_eq!(chart.x_label(), "State");
        assert_eq!(chart.y_label(), "births");
        assert_eq!(chart.legend_title(), Some("gender"));
    }

    #[test]
    fn scatter_points_carry_size() {
        let config = ChartConfig {
            title: "Scatter".into(),
            kind: ChartKind::Scatter,
            group_by: vec!["state".into()],
            reductions: vec![
                Reduction::new("births", AggOp::Mean).alias("avg"),
                Reduction::new("births", AggOp::Sum).alias("total"),
            ],
            x: "avg".into(),
            y: "total".into(),
            color: None,
            size: Some("total".into()),
            labels: BTreeMap::new(),
        };
        let chart = ChartSpec::build(&config, &dataset());
        let series = chart.series();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, None);
        assert_eq!(series[0].points[1].size, Some(5.0));
        assert_eq!(chart.max_size(), Some(31.0));
    }

    #[test]
    fn table_view_keeps_unaggregated_rows() {
        let mut ds = dataset();
        ds.rows[0].insert("births".into(), Value::Null);
        let table = TableView::from_dataset(&ds);
        assert_eq!(table.columns, vec!["state", "gender", "births"]);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0], vec!["CA", "M", ""]);
    }

    #[test]
    fn metric_formatting() {
        let config = MetricConfig {
            label: "Average".into(),
            reduction: Reduction::new("births", AggOp::Mean),
            prefix: Some("$".into()),
        };
        let metric = Metric::build(&config, &dataset());
        assert_eq!(metric.value, Value::Float(9.0));
        assert_eq!(metric.display(), "$9.00");
    }
}
