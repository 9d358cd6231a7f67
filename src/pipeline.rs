//! One dashboard run: load → normalize → validate → coerce → filter →
//! aggregate → present.
//!
//! ```text
//!  .csv / .xlsx / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  prepare  │  load, normalize names, require fields, coerce types
//!   └──────────┘
//!        │  Dataset (fatal DashboardError on failure)
//!        ▼
//!   ┌──────────┐
//!   │  render   │  filter rows, aggregate per chart, build table/metrics
//!   └──────────┘
//!        │
//!        ▼
//!   RunOutcome::Rendered(View) | RunOutcome::NoData(EmptyResultWarning)
//! ```

use std::collections::BTreeMap;

use crate::config::DashboardConfig;
use crate::data::coerce::coerce;
use crate::data::filter::{distinct_values, filter_rows, FilterSpec, Selection};
use crate::data::loader::load_dataset;
use crate::data::model::{Dataset, Value};
use crate::data::schema::{normalize_columns, require_fields};
use crate::error::{EmptyResultWarning, Result};
use crate::present::{ChartSpec, Metric, TableView, View};

/// Column → current selection.  Columns without an entry are unrestricted.
pub type Selections = BTreeMap<String, Selection>;

/// A sidebar control: its column, label and the options after `All`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub column: String,
    pub label: String,
    pub options: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Rendered(View),
    NoData(EmptyResultWarning),
}

/// Load the configured file and make it ready for filtering.
pub fn prepare(config: &DashboardConfig) -> Result<Dataset> {
    let raw = load_dataset(&config.data_path)?;
    prepare_dataset(raw, config)
}

/// Normalize column names, enforce the schema contract and coerce types.
pub fn prepare_dataset(raw: Dataset, config: &DashboardConfig) -> Result<Dataset> {
    let dataset = normalize_columns(raw);
    if let Err(e) = require_fields(&dataset, &config.required_fields) {
        log::error!("{}: {e}", config.id);
        return Err(e.into());
    }
    let (dataset, report) = coerce(dataset, &config.coercion_columns(), &config.required_column);
    log::debug!("{}: coercion report {report:?}", config.id);
    Ok(dataset)
}

/// One control per configured filter dimension, options sorted.
pub fn filter_controls(dataset: &Dataset, config: &DashboardConfig) -> Vec<FilterControl> {
    config
        .filters
        .iter()
        .map(|dim| FilterControl {
            column: dim.column.clone(),
            label: dim.label.clone(),
            options: distinct_values(dataset, &dim.column).into_iter().collect(),
        })
        .collect()
}

/// Filter, aggregate and present.  Pure: the outcome depends only on the
/// arguments, so nothing from an earlier run can leak into it.
pub fn render(dataset: &Dataset, config: &DashboardConfig, selections: &Selections) -> RunOutcome {
    let filters: Vec<FilterSpec> = config
        .filters
        .iter()
        .map(|dim| {
            let selection = selections.get(&dim.column).cloned().unwrap_or_default();
            FilterSpec::new(dim.column.clone(), selection)
        })
        .collect();

    let filtered = match filter_rows(dataset, &filters) {
        Ok(filtered) => filtered,
        Err(warning) => return RunOutcome::NoData(warning),
    };

    RunOutcome::Rendered(View {
        charts: config
            .charts
            .iter()
            .map(|c| ChartSpec::build(c, &filtered))
            .collect(),
        metrics: config
            .metrics
            .iter()
            .map(|m| Metric::build(m, &filtered))
            .collect(),
        table: TableView::from_dataset(&filtered),
        row_count: filtered.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::natality;
    use crate::data::model::Row;
    use crate::error::DashboardError;

    fn raw() -> Dataset {
        let columns = ["State of Residence", "Month", "Month Code", "Year Code", "Sex of Infant", "Births"];
        let data = [
            ("Texas", "January", 1, "F", Value::Integer(7)),
            ("Alabama", "January", 1, "M", Value::from("12")),
            ("Alabama", "February", 2, "F", Value::from("suppressed")),
            ("Alabama", "February", 2, "F", Value::Integer(9)),
        ];
        let rows = data
            .into_iter()
            .map(|(state, month, code, sex, births)| {
                let cells = [
                    Value::from(state),
                    Value::from(month),
                    Value::Integer(code),
                    Value::Integer(2025),
                    Value::from(sex),
                    births,
                ];
                columns.iter().map(|c| c.to_string()).zip(cells).collect::<Row>()
            })
            .collect();
        Dataset::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn prepare_normalizes_and_drops_bad_measures() {
        let ds = prepare_dataset(raw(), &natality()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names[0], "state_of_residence");
        assert_eq!(ds.rows[1]["births"], Value::Integer(12));
    }

    #[test]
    fn schema_error_lists_missing_fields() {
        let mut ds = raw();
        ds.column_names.retain(|c| c != "Month Code");
        for row in &mut ds.rows {
            row.remove("Month Code");
        }
        match prepare_dataset(ds, &natality()) {
            Err(DashboardError::Schema(e)) => assert_eq!(e.missing, vec!["month_code"]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn render_builds_charts_metrics_and_table() {
        let config = natality();
        let ds = prepare_dataset(raw(), &config).unwrap();
        let RunOutcome::Rendered(view) = render(&ds, &config, &Selections::new()) else {
            panic!("expected a rendered view");
        };
        assert_eq!(view.row_count, 3);
        assert_eq!(view.table.rows.len(), 3);
        assert_eq!(view.charts.len(), 1);
        let chart = &view.charts[0];
        assert_eq!(chart.categories(), vec![Value::from("Alabama"), Value::from("Texas")]);
        assert_eq!(view.metrics[0].value, Value::Integer(28));
        assert_eq!(view.metrics[1].value, Value::Integer(3));
    }

    #[test]
    fn controls_list_sorted_options() {
        let config = natality();
        let ds = prepare_dataset(raw(), &config).unwrap();
        let controls = filter_controls(&ds, &config);
        assert_eq!(controls.len(), 3);
        assert_eq!(controls[0].column, "month");
        assert_eq!(controls[0].options, vec![Value::from("February"), Value::from("January")]);
    }

    #[test]
    fn empty_selection_stops_rendering() {
        let config = natality();
        let ds = prepare_dataset(raw(), &config).unwrap();
        let selections: Selections = [("sex_of_infant".to_string(), Selection::Empty)].into_iter().collect();
        assert_eq!(render(&ds, &config, &selections), RunOutcome::NoData(EmptyResultWarning));
    }
}
