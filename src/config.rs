//! Dashboard definitions.
//!
//! Two dashboards ship built in.  `RUSTY_DASH_CONFIG` may name a JSON file
//! holding a list of [`DashboardConfig`] that replaces them, and
//! `RUSTY_DASH_<ID>_DATA` overrides one dashboard's input file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::{AggOp, Reduction};
use crate::data::coerce::ColumnType;
use crate::data::filter::FilterDimension;
use crate::data::schema::normalize_column_name;
use crate::error::DashboardError;
use crate::present::ChartKind;

pub const CONFIG_ENV: &str = "RUSTY_DASH_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coercion {
    pub column: String,
    pub to: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub title: String,
    pub kind: ChartKind,
    pub group_by: Vec<String>,
    pub reductions: Vec<Reduction>,
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    /// Column → axis / legend label.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub label: String,
    pub reduction: Reduction,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Short identifier, also used for the data path environment override.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub data_path: PathBuf,
    /// Logical fields that must exist after normalization.
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub coercions: Vec<Coercion>,
    /// Rows with no usable value here after coercion are dropped.
    pub required_column: String,
    pub filters: Vec<FilterDimension>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

impl DashboardConfig {
    pub fn coercion_columns(&self) -> Vec<(String, ColumnType)> {
        self.coercions
            .iter()
            .map(|c| (c.column.clone(), c.to))
            .collect()
    }

    /// Name of the environment variable overriding `data_path`.
    pub fn data_env_var(&self) -> String {
        format!("RUSTY_DASH_{}_DATA", self.id.to_ascii_uppercase())
    }

    /// Check that every referenced column is a required field and that chart
    /// encodings name a key column or a reduction output.
    pub fn validate(&self) -> Result<(), DashboardError> {
        let invalid = |msg: String| Err(DashboardError::Config(format!("{}: {msg}", self.id)));

        let required: Vec<String> = self
            .required_fields
            .iter()
            .map(|f| normalize_column_name(f))
            .collect();
        let is_required = |c: &str| required.iter().any(|r| r == c);

        if !is_required(self.required_column.as_str()) {
            return invalid(format!("required column {:?} is not a required field", self.required_column));
        }
        for f in &self.filters {
            if !is_required(f.column.as_str()) {
                return invalid(format!("filter column {:?} is not a required field", f.column));
            }
        }
        for m in &self.metrics {
            if !is_required(m.reduction.column.as_str()) {
                return invalid(format!("metric column {:?} is not a required field", m.reduction.column));
            }
        }
        for chart in &self.charts {
            for c in chart.group_by.iter().chain(chart.reductions.iter().map(|r| &r.column)) {
                if !is_required(c.as_str()) {
                    return invalid(format!("chart {:?} uses unknown column {c:?}", chart.title));
                }
            }
            let outputs: Vec<&str> = chart.reductions.iter().map(Reduction::output_name).collect();
            let is_key = |c: &str| chart.group_by.iter().any(|g| g == c);
            let is_output = |c: &str| outputs.contains(&c);

            if !is_key(chart.x.as_str()) && !is_output(chart.x.as_str()) {
                return invalid(format!("chart {:?}: x {:?} is not aggregated", chart.title, chart.x));
            }
            if !is_output(chart.y.as_str()) {
                return invalid(format!("chart {:?}: y {:?} is not a reduction", chart.title, chart.y));
            }
            if let Some(size) = &chart.size {
                if !is_output(size.as_str()) {
                    return invalid(format!("chart {:?}: size {size:?} is not a reduction", chart.title));
                }
            }
            if let Some(color) = &chart.color {
                if !is_key(color.as_str()) {
                    return invalid(format!("chart {:?}: color {color:?} is not a group key", chart.title));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Dashboards to show: the JSON file named by `RUSTY_DASH_CONFIG` when set,
/// the built-in presets otherwise.  Data path overrides are applied last.
pub fn load_dashboards() -> Result<Vec<DashboardConfig>> {
    let mut dashboards = match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_config_file(Path::new(&path))?,
        None => presets(),
    };
    for dashboard in &mut dashboards {
        if let Some(path) = std::env::var_os(dashboard.data_env_var()) {
            log::info!(
                "{}: data path overridden to {}",
                dashboard.id,
                Path::new(&path).display()
            );
            dashboard.data_path = PathBuf::from(path);
        }
    }
    Ok(dashboards)
}

pub fn load_config_file(path: &Path) -> Result<Vec<DashboardConfig>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading dashboard config {}", path.display()))?;
    let dashboards: Vec<DashboardConfig> =
        serde_json::from_str(&text).context("parsing dashboard config")?;
    for d in &dashboards {
        d.validate()?;
    }
    Ok(dashboards)
}

// ---------------------------------------------------------------------------
// Built-in dashboards
// ---------------------------------------------------------------------------

pub fn presets() -> Vec<DashboardConfig> {
    vec![natality(), retail()]
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn dimension(column: &str, label: &str) -> FilterDimension {
    FilterDimension {
        column: column.to_string(),
        label: label.to_string(),
    }
}

/// Births by state and gender from the CDC provisional natality export.
pub fn natality() -> DashboardConfig {
    DashboardConfig {
        id: "natality".into(),
        title: "Provisional Natality Data Dashboard".into(),
        subtitle: Some("Birth Analysis by State and Gender".into()),
        data_path: PathBuf::from("Provisional_Natality_2025_CDC.csv"),
        required_fields: strings(&[
            "state_of_residence",
            "month",
            "month_code",
            "year_code",
            "sex_of_infant",
            "births",
        ]),
        coercions: vec![Coercion {
            column: "births".into(),
            to: ColumnType::Numeric,
        }],
        required_column: "births".into(),
        filters: vec![
            dimension("month", "Select Month(s)"),
            dimension("sex_of_infant", "Select Gender(s)"),
            dimension("state_of_residence", "Select State(s)"),
        ],
        charts: vec![ChartConfig {
            title: "Total Births by State and Gender".into(),
            kind: ChartKind::Bar,
            group_by: strings(&["state_of_residence", "sex_of_infant"]),
            reductions: vec![Reduction::new("births", AggOp::Sum)],
            x: "state_of_residence".into(),
            y: "births".into(),
            color: Some("sex_of_infant".into()),
            size: None,
            labels: labels(&[
                ("state_of_residence", "State"),
                ("births", "Total Births"),
                ("sex_of_infant", "Gender"),
            ]),
        }],
        metrics: vec![
            MetricConfig {
                label: "Total Births".into(),
                reduction: Reduction::new("births", AggOp::Sum),
                prefix: None,
            },
            MetricConfig {
                label: "Records".into(),
                reduction: Reduction::new("births", AggOp::Count),
                prefix: None,
            },
            MetricConfig {
                label: "Average Births per Record".into(),
                reduction: Reduction::new("births", AggOp::Mean),
                prefix: None,
            },
        ],
    }
}

/// Retail transactions: revenue, customers and satisfaction.
pub fn retail() -> DashboardConfig {
    DashboardConfig {
        id: "retail".into(),
        title: "Retail Customer Dashboard".into(),
        subtitle: Some("Revenue and Satisfaction by Segment".into()),
        data_path: PathBuf::from("Retail_Customer_Transactions.xlsx"),
        required_fields: strings(&[
            "label",
            "customerid",
            "transactionid",
            "transactiondate",
            "productcategory",
            "purchaseamount",
            "customeragegroup",
            "customergender",
            "customerregion",
            "customersatisfaction",
            "retailchannel",
        ]),
        coercions: vec![
            Coercion {
                column: "purchaseamount".into(),
                to: ColumnType::Numeric,
            },
            Coercion {
                column: "customersatisfaction".into(),
                to: ColumnType::Numeric,
            },
            Coercion {
                column: "transactiondate".into(),
                to: ColumnType::Date,
            },
        ],
        required_column: "purchaseamount".into(),
        filters: vec![
            dimension("customerregion", "Select Region(s)"),
            dimension("productcategory", "Select Product Category(s)"),
            dimension("customergender", "Select Gender(s)"),
            dimension("customeragegroup", "Select Age Group(s)"),
            dimension("retailchannel", "Select Channel(s)"),
        ],
        charts: vec![
            ChartConfig {
                title: "Revenue by Product Category and Region".into(),
                kind: ChartKind::Bar,
                group_by: strings(&["productcategory", "customerregion"]),
                reductions: vec![Reduction::new("purchaseamount", AggOp::Sum).alias("revenue")],
                x: "productcategory".into(),
                y: "revenue".into(),
                color: Some("customerregion".into()),
                size: None,
                labels: labels(&[
                    ("productcategory", "Product Category"),
                    ("revenue", "Revenue"),
                    ("customerregion", "Region"),
                ]),
            },
            ChartConfig {
                title: "Customers by Age Group and Gender".into(),
                kind: ChartKind::Bar,
                group_by: strings(&["customeragegroup", "customergender"]),
                reductions: vec![Reduction::new("customerid", AggOp::Nunique).alias("customers")],
                x: "customeragegroup".into(),
                y: "customers".into(),
                color: Some("customergender".into()),
                size: None,
                labels: labels(&[
                    ("customeragegroup", "Age Group"),
                    ("customers", "Unique Customers"),
                    ("customergender", "Gender"),
                ]),
            },
            ChartConfig {
                title: "Satisfaction vs. Revenue by Product Category".into(),
                kind: ChartKind::Scatter,
                group_by: strings(&["productcategory", "retailchannel"]),
                reductions: vec![
                    Reduction::new("customersatisfaction", AggOp::Mean).alias("avg_satisfaction"),
                    Reduction::new("purchaseamount", AggOp::Sum).alias("revenue"),
                ],
                x: "avg_satisfaction".into(),
                y: "revenue".into(),
                color: Some("retailchannel".into()),
                size: Some("revenue".into()),
                labels: labels(&[
                    ("avg_satisfaction", "Average Satisfaction"),
                    ("revenue", "Revenue"),
                    ("retailchannel", "Channel"),
                ]),
            },
        ],
        metrics: vec![
            MetricConfig {
                label: "Total Revenue".into(),
                reduction: Reduction::new("purchaseamount", AggOp::Sum),
                prefix: Some("$".into()),
            },
            MetricConfig {
                label: "Transactions".into(),
                reduction: Reduction::new("transactionid", AggOp::Count),
                prefix: None,
            },
            MetricConfig {
                label: "Average Purchase".into(),
                reduction: Reduction::new("purchaseamount", AggOp::Mean),
                prefix: Some("$".into()),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for d in presets() {
            d.validate().unwrap();
        }
    }

    #[test]
    fn encoding_must_be_aggregated() {
        let mut d = natality();
        d.charts[0].y = "month".into();
        assert!(matches!(d.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn filter_on_unknown_column_is_rejected() {
        let mut d = retail();
        d.filters.push(dimension("store", "Store"));
        assert!(d.validate().is_err());
    }

    #[test]
    fn config_file_round_trips_through_json() {
        let mut tmp = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        serde_json::to_writer(&mut tmp, &presets()).unwrap();
        let loaded = load_config_file(tmp.path()).unwrap();
        assert_eq!(loaded, presets());
    }

    #[test]
    fn transactions_metric_counts_records() {
        use crate::data::model::{Dataset, Row, Value};
        use crate::present::Metric;

        let rows = ["T1", "T1", "T2"]
            .into_iter()
            .map(|id| {
                [("transactionid".to_string(), Value::from(id))]
                    .into_iter()
                    .collect::<Row>()
            })
            .collect();
        let ds = Dataset::new(vec!["transactionid".into()], rows);

        let retail = retail();
        let config = retail
            .metrics
            .iter()
            .find(|m| m.label == "Transactions")
            .unwrap();
        assert_eq!(config.reduction.op, AggOp::Count);
        assert_eq!(Metric::build(config, &ds).value, Value::Integer(3));
    }

    #[test]
    fn data_env_var_uses_upper_case_id() {
        assert_eq!(retail().data_env_var(), "RUSTY_DASH_RETAIL_DATA");
    }
}
