use std::io::Write;

use rusty_dash::config::{natality, retail};
use rusty_dash::data::aggregate::{aggregate, AggOp, Reduction};
use rusty_dash::data::filter::{apply_filters, Choice, FilterSpec, Selection};
use rusty_dash::data::model::Value;
use rusty_dash::error::{DashboardError, EmptyResultWarning};
use rusty_dash::pipeline::{self, RunOutcome, Selections};
use rusty_dash::state::AppState;
use tempfile::NamedTempFile;

const NATALITY_CSV: &str = "\
State of Residence , Month ,Month Code,Year Code,Sex of Infant,Births
CA,January,1,2025,M,10
CA,January,1,2025,F,20
NY,February,2,2025,M,5
NY,February,2,2025,F,Suppressed
";

fn csv_file(contents: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(tmp, "{contents}").unwrap();
    tmp
}

fn natality_state(tmp: &NamedTempFile) -> AppState {
    let mut config = natality();
    config.data_path = tmp.path().to_path_buf();
    AppState::new(config)
}

#[test]
fn natality_end_to_end() {
    let tmp = csv_file(NATALITY_CSV);
    let mut state = natality_state(&tmp);
    state.run();

    assert!(state.error.is_none());
    assert_eq!(state.total_rows(), 3);
    let Some(RunOutcome::Rendered(view)) = &state.outcome else {
        panic!("expected a rendered view");
    };

    let chart = &view.charts[0];
    let rows: Vec<(String, String, Value)> = chart
        .data
        .rows
        .iter()
        .map(|r| (r.key[0].to_string(), r.key[1].to_string(), r.values[0].clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("CA".to_string(), "F".to_string(), Value::Integer(20)),
            ("CA".to_string(), "M".to_string(), Value::Integer(10)),
            ("NY".to_string(), "M".to_string(), Value::Integer(5)),
        ]
    );
    assert_eq!(view.table.rows.len(), 3);
    assert_eq!(view.metrics[0].display(), "35");
}

#[test]
fn state_filter_limits_aggregation() {
    let tmp = csv_file(NATALITY_CSV);
    let mut state = natality_state(&tmp);
    state.run();
    state.set_all("state_of_residence", false);
    state.set_value("state_of_residence", &Value::from("CA"), true);

    let Some(RunOutcome::Rendered(view)) = &state.outcome else {
        panic!("expected a rendered view");
    };
    assert_eq!(view.row_count, 2);
    assert_eq!(view.charts[0].categories(), vec![Value::from("CA")]);
    assert_eq!(view.metrics[0].value, Value::Integer(30));
}

#[test]
fn deselecting_everything_warns_and_recovers() {
    let tmp = csv_file(NATALITY_CSV);
    let mut state = natality_state(&tmp);
    state.run();

    state.select_none("sex_of_infant");
    assert_eq!(state.outcome, Some(RunOutcome::NoData(EmptyResultWarning)));
    assert!(state.error.is_none());

    state.set_all("sex_of_infant", true);
    assert_eq!(state.visible_rows(), 3);
}

#[test]
fn unchanged_file_is_loaded_once() {
    let tmp = csv_file(NATALITY_CSV);
    let mut state = natality_state(&tmp);
    state.run();
    state.set_all("month", false);
    state.set_all("month", true);
    assert_eq!(state.loads(), 1);

    let mut file = tmp.reopen().unwrap();
    file.set_len(0).unwrap();
    write!(file, "{NATALITY_CSV}TX,March,3,2025,F,7\n").unwrap();
    file.sync_all().unwrap();

    state.run();
    assert_eq!(state.loads(), 2);
    assert_eq!(state.total_rows(), 4);
}

#[test]
fn missing_required_fields_are_reported() {
    let tmp = csv_file("STATE OF RESIDENCE,Month,Births\nCA,January,3\n");
    let mut state = natality_state(&tmp);
    state.run();

    match &state.error {
        Some(DashboardError::Schema(e)) => {
            assert_eq!(e.missing, vec!["month_code", "sex_of_infant", "year_code"]);
            assert_eq!(e.available, vec!["state_of_residence", "month", "births"]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
    assert!(state.outcome.is_none());
    assert!(state.controls.is_empty());
}

#[test]
fn retail_dashboard_renders_all_charts() {
    let tmp = csv_file(
        "Label,CustomerID,TransactionID,TransactionDate,ProductCategory,PurchaseAmount,\
CustomerAgeGroup,CustomerGender,CustomerRegion,CustomerSatisfaction,RetailChannel
New,1,T1,2025-01-03,Books,10.50,18-24,Female,East,4,Online
New,1,T2,03/04/2025,Books,4.50,18-24,Female,East,n/a,Online
Loyal,2,T3,not a date,Home,100,35-44,Male,West,2,In-Store
Loyal,3,T4,2025-02-01,Home,,35-44,Male,West,5,In-Store
",
    );
    let mut config = retail();
    config.data_path = tmp.path().to_path_buf();
    let dataset = pipeline::prepare(&config).unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.rows[2]["transactiondate"], Value::Null);
    assert_eq!(dataset.rows[1]["customersatisfaction"], Value::Null);

    let RunOutcome::Rendered(view) = pipeline::render(&dataset, &config, &Selections::new()) else {
        panic!("expected a rendered view");
    };
    assert_eq!(view.charts.len(), 3);
    assert_eq!(view.metrics[0].display(), "$115.00");
    assert_eq!(view.metrics[1].value, Value::Integer(3));

    let customers = &view.charts[1];
    assert_eq!(
        customers.data.column("customers"),
        Some(vec![&Value::Integer(1), &Value::Integer(1)])
    );

    let scatter = &view.charts[2];
    let points: Vec<(f64, f64)> = scatter
        .series()
        .iter()
        .flat_map(|s| s.points.iter().map(|p| (p.x.as_f64().unwrap(), p.y)))
        .collect();
    assert_eq!(points, vec![(2.0, 100.0), (4.0, 15.0)]);
}

#[test]
fn filters_commute_and_never_add_rows() {
    let tmp = csv_file(NATALITY_CSV);
    let config = {
        let mut c = natality();
        c.data_path = tmp.path().to_path_buf();
        c
    };
    let dataset = pipeline::prepare(&config).unwrap();

    let month = FilterSpec::new(
        "month",
        Selection::from_choices(vec![Choice::Value(Value::from("January"))]),
    );
    let sex = FilterSpec::new(
        "sex_of_infant",
        Selection::from_choices(vec![Choice::Value(Value::from("M")), Choice::Value(Value::from("F"))]),
    );
    let state = FilterSpec::new("state_of_residence", Selection::All);

    let orders = [
        vec![month.clone(), sex.clone(), state.clone()],
        vec![sex.clone(), state.clone(), month.clone()],
        vec![state.clone(), month.clone(), sex.clone()],
    ];
    let results: Vec<_> = orders.iter().map(|o| apply_filters(&dataset, o)).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    for row in &results[0].rows {
        assert!(dataset.rows.contains(row));
    }
    assert_eq!(results[0].len(), 2);

    let total = aggregate(&results[0], &["sex_of_infant"], &[Reduction::new("births", AggOp::Sum)]);
    let sum: f64 = total.rows.iter().filter_map(|r| r.values[0].as_f64()).sum();
    assert_eq!(sum, 30.0);
}

#[test]
fn stray_boolean_in_measure_column_drops_the_row() {
    let tmp = csv_file(
        "State of Residence,Month,Month Code,Year Code,Sex of Infant,Births
CA,January,1,2025,M,10
CA,January,1.0,2025,F,TRUE
",
    );
    let mut state = natality_state(&tmp);
    state.run();

    assert_eq!(state.total_rows(), 1);
    let Some(RunOutcome::Rendered(view)) = &state.outcome else {
        panic!("expected a rendered view");
    };
    assert_eq!(view.metrics[0].value, Value::Integer(10));

    let dataset = state.dataset.as_ref().unwrap();
    assert_eq!(dataset.rows[0]["month_code"], Value::Float(1.0));
}

#[test]
fn mixed_integer_and_float_keys_share_one_option() {
    let tmp = csv_file(
        "State of Residence,Month,Month Code,Year Code,Sex of Infant,Births
CA,January,1,2025,M,10
CA,January,1.0,2025,F,20
",
    );
    let mut config = natality();
    config.data_path = tmp.path().to_path_buf();
    let dataset = pipeline::prepare(&config).unwrap();

    let groups = aggregate(&dataset, &["month_code"], &[Reduction::new("births", AggOp::Sum)]);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.rows[0].values[0], Value::Integer(30));
}
