use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Row, Value};
use crate::error::DashboardError;

/// Cell texts read as missing values, following the Pandas defaults.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset, mapping failures onto the dashboard error taxonomy.
///
/// A missing file is reported as [`DashboardError::FileNotFound`] before any
/// parsing is attempted.
pub fn load_dataset(path: &Path) -> Result<Dataset, DashboardError> {
    if !path.is_file() {
        log::error!("Dataset file not found: {}", path.display());
        return Err(DashboardError::FileNotFound(path.to_path_buf()));
    }
    let dataset = load_file(path).map_err(|e| DashboardError::Load {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    })?;
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names,
        path.display()
    );
    Ok(dataset)
}

/// Load a tabular file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                           – header row, one record per row
/// * `.xlsx` / `.xlsm` / `.xls` / `.xlsb` / `.ods` – first worksheet, first row is the header
/// * `.json`                          – `[{ "col": value, ... }, ...]`
/// * `.parquet`                       – flat columns
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_spreadsheet(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Insert a cell unless the column was already seen (duplicate headers keep the first).
fn push_column(column_names: &mut Vec<String>, name: &str) {
    if !column_names.iter().any(|c| c == name) {
        column_names.push(name.to_string());
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut column_names = Vec::with_capacity(headers.len());
    for h in &headers {
        push_column(&mut column_names, h);
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        records.push(result.with_context(|| format!("CSV row {row_no}"))?);
    }

    // One type per column, decided from all of its non-null cells.
    let kinds: Vec<Option<CellKind>> = (0..headers.len())
        .map(|col_idx| {
            records
                .iter()
                .filter_map(|r| r.get(col_idx).and_then(cell_kind))
                .reduce(CellKind::widen)
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            let mut row = Row::new();
            for (col_idx, col_name) in headers.iter().enumerate() {
                let value = match (record.get(col_idx), kinds[col_idx]) {
                    (Some(cell), Some(kind)) => parse_cell(cell, kind),
                    _ => Value::Null,
                };
                row.entry(col_name.clone()).or_insert(value);
            }
            row
        })
        .collect();

    Ok(Dataset::new(column_names, rows))
}

/// Inferred type of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl CellKind {
    /// Narrowest kind holding both; integers widen to floats, any other mix is text.
    fn widen(self, other: CellKind) -> CellKind {
        use CellKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Kind of a single cell; `None` for missing values.
fn cell_kind(s: &str) -> Option<CellKind> {
    if is_null_token(s) {
        return None;
    }
    let trimmed = s.trim();
    let kind = if trimmed.parse::<i64>().is_ok() {
        CellKind::Integer
    } else if trimmed.parse::<f64>().is_ok() {
        CellKind::Float
    } else if parse_bool(trimmed).is_some() {
        CellKind::Bool
    } else {
        CellKind::Text
    };
    Some(kind)
}

/// Read a cell as its column's kind, the way `read_csv` types a column.
fn parse_cell(s: &str, kind: CellKind) -> Value {
    if is_null_token(s) {
        return Value::Null;
    }
    let trimmed = s.trim();
    let parsed = match kind {
        CellKind::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        CellKind::Float => trimmed.parse::<f64>().ok().map(Value::from),
        CellKind::Bool => parse_bool(trimmed).map(Value::Bool),
        CellKind::Text => None,
    };
    parsed.unwrap_or_else(|| Value::String(s.to_string()))
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;

    let mut cells = range.rows();
    let Some(header_row) = cells.next() else {
        return Ok(Dataset::default());
    };
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();

    let mut column_names = Vec::with_capacity(headers.len());
    for h in &headers {
        push_column(&mut column_names, h);
    }

    let mut rows = Vec::new();
    for record in cells {
        // Trailing formatted-but-empty rows are common in hand-edited workbooks.
        if record.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let mut row = Row::new();
        for (col_idx, col_name) in headers.iter().enumerate() {
            let value = record.get(col_idx).map(spreadsheet_value).unwrap_or(Value::Null);
            row.entry(col_name.clone()).or_insert(value);
        }
        rows.push(row);
    }

    Ok(Dataset::new(column_names, rows))
}

/// Spreadsheets store every number as a float; integral ones come back as integers.
fn spreadsheet_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Value::Integer(*f as i64)
            } else {
                Value::from(*f)
            }
        }
        Data::String(s) => {
            if NULL_TOKENS.contains(&s.trim()) {
                Value::Null
            } else {
                Value::String(s.clone())
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            cell.as_date().map(Value::Date).unwrap_or(Value::Null)
        }
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "State of Residence": "Alabama", "Births": 4821 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut column_names = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = Row::new();
        for (key, val) in obj {
            push_column(&mut column_names, key);
            row.insert(key.clone(), json_to_value(val));
        }
        rows.push(row);
    }

    Ok(Dataset::new(column_names, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row_idx in 0..batch.num_rows() {
            let mut row = Row::new();
            for (col_idx, col_name) in column_names.iter().enumerate() {
                row.insert(col_name.clone(), arrow_value(batch.column(col_idx), row_idx));
            }
            rows.push(row);
        }
    }

    Ok(Dataset::new(column_names, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_value(col: &ArrayRef, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col.as_string_opt::<i32>().map(|a| Value::String(a.value(row).to_string())),
        DataType::LargeUtf8 => col.as_string_opt::<i64>().map(|a| Value::String(a.value(row).to_string())),
        DataType::Int16 => col.as_primitive_opt::<Int16Type>().map(|a| Value::Integer(a.value(row) as i64)),
        DataType::Int32 => col.as_primitive_opt::<Int32Type>().map(|a| Value::Integer(a.value(row) as i64)),
        DataType::Int64 => col.as_primitive_opt::<Int64Type>().map(|a| Value::Integer(a.value(row))),
        DataType::Float32 => col.as_primitive_opt::<Float32Type>().map(|a| Value::from(a.value(row) as f64)),
        DataType::Float64 => col.as_primitive_opt::<Float64Type>().map(|a| Value::from(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| Value::Bool(a.value(row))),
        DataType::Date32 => col
            .as_primitive_opt::<Date32Type>()
            .and_then(|a| a.value_as_date(row))
            .map(Value::Date),
        other => Some(Value::String(format!("{other:?}"))),
    };
    value.unwrap_or(Value::Null)
}
