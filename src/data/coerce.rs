use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::model::{Dataset, Value};

/// Accepted textual date layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Target type of a coerced column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date,
}

/// Outcome of converting one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Value(T),
    Null,
}

impl<T> From<Option<T>> for Coerced<T> {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Coerced::Null, Coerced::Value)
    }
}

impl<T: Into<Value>> Coerced<T> {
    pub fn into_value(self) -> Value {
        match self {
            Coerced::Value(v) => v.into(),
            Coerced::Null => Value::Null,
        }
    }
}

/// A numeric cell keeps its integer-ness so integer sums stay exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::from(f),
        }
    }
}

pub fn to_numeric(value: &Value) -> Coerced<Number> {
    match value {
        Value::Integer(i) => Coerced::Value(Number::Integer(*i)),
        Value::Float(f) if f.is_finite() => Coerced::Value(Number::Float(*f)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Coerced::Value(Number::Integer(i))
            } else {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Number::Float)
                    .into()
            }
        }
        _ => Coerced::Null,
    }
}

pub fn to_date(value: &Value) -> Coerced<NaiveDate> {
    match value {
        Value::Date(d) => Coerced::Value(*d),
        Value::String(s) => parse_date(s.trim()).into(),
        _ => Coerced::Null,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn coerce_value(value: &Value, ty: ColumnType) -> Value {
    match ty {
        ColumnType::Numeric => to_numeric(value).into_value(),
        ColumnType::Date => to_date(value).into_value(),
    }
}

/// What coercion did to a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    /// Rows removed because the required column was null after coercion.
    pub dropped_rows: usize,
    /// Per column: cells that held data before coercion but are null after it.
    pub nulled_cells: BTreeMap<String, usize>,
}

/// Force `columns` to their target types, then drop rows whose `required`
/// column ended up null.  Malformed cells become null; nothing here fails.
pub fn coerce(
    mut dataset: Dataset,
    columns: &[(String, ColumnType)],
    required: &str,
) -> (Dataset, CoercionReport) {
    let mut report = CoercionReport::default();

    for row in &mut dataset.rows {
        for (column, ty) in columns {
            let before = Dataset::cell(row, column);
            let after = coerce_value(before, *ty);
            if after.is_null() && !before.is_null() {
                *report.nulled_cells.entry(column.clone()).or_default() += 1;
            }
            row.insert(column.clone(), after);
        }
    }

    let before = dataset.rows.len();
    dataset
        .rows
        .retain(|row| !Dataset::cell(row, required).is_null());
    report.dropped_rows = before - dataset.rows.len();

    for (column, n) in &report.nulled_cells {
        log::debug!("Coercion nulled {n} malformed cells in {column:?}");
    }
    if report.dropped_rows > 0 {
        log::info!(
            "Dropped {} rows with no usable {required:?} value",
            report.dropped_rows
        );
    }

    (dataset, report)
}
