use std::collections::BTreeSet;

use super::model::{Dataset, Row};
use crate::error::SchemaError;

/// Canonical column name: trimmed, lowercased, spaces replaced by underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Rename every column to its canonical form.
///
/// When two source columns collapse onto the same canonical name the first one
/// wins and the later one is dropped.
pub fn normalize_columns(dataset: Dataset) -> Dataset {
    let mut canonical: Vec<(String, String)> = Vec::with_capacity(dataset.column_names.len());
    for raw in &dataset.column_names {
        let name = normalize_column_name(raw);
        if canonical.iter().any(|(_, c)| *c == name) {
            log::warn!("Column {raw:?} normalizes to {name:?} which already exists; dropping it");
            continue;
        }
        canonical.push((raw.clone(), name));
    }

    let rows = dataset
        .rows
        .into_iter()
        .map(|mut row| {
            canonical
                .iter()
                .filter_map(|(raw, name)| row.remove(raw).map(|v| (name.clone(), v)))
                .collect::<Row>()
        })
        .collect();

    Dataset {
        rows,
        column_names: canonical.into_iter().map(|(_, name)| name).collect(),
    }
}

/// Check that every required logical field is present.
///
/// Required names are normalized before comparison so the check is case- and
/// whitespace-insensitive.
pub fn require_fields<S: AsRef<str>>(dataset: &Dataset, required: &[S]) -> Result<(), SchemaError> {
    let available: BTreeSet<&str> = dataset.column_names.iter().map(String::as_str).collect();
    let missing: BTreeSet<String> = required
        .iter()
        .map(|r| normalize_column_name(r.as_ref()))
        .filter(|r| !available.contains(r.as_str()))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(SchemaError {
        missing: missing.into_iter().collect(),
        available: dataset.column_names.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn raw_dataset() -> Dataset {
        let row: Row = [
            (" State of Residence ".to_string(), Value::from("CA")),
            ("Births".to_string(), Value::Integer(10)),
        ]
        .into_iter()
        .collect();
        Dataset::new(
            vec![" State of Residence ".to_string(), "Births".to_string()],
            vec![row],
        )
    }

    #[test]
    fn names_are_canonicalised() {
        assert_eq!(normalize_column_name("  Sex of Infant "), "sex_of_infant");
        assert_eq!(normalize_column_name("Month_Code"), "month_code");
    }

    #[test]
    fn normalize_renames_rows_and_columns() {
        let ds = normalize_columns(raw_dataset());
        assert_eq!(ds.column_names, vec!["state_of_residence", "births"]);
        assert_eq!(ds.rows[0]["state_of_residence"], Value::from("CA"));
        assert_eq!(ds.rows[0]["births"], Value::Integer(10));
    }

    #[test]
    fn colliding_names_keep_first_column() {
        let row: Row = [
            ("Births".to_string(), Value::Integer(1)),
            ("births ".to_string(), Value::Integer(2)),
        ]
        .into_iter()
        .collect();
        let ds = Dataset::new(vec!["Births".into(), "births ".into()], vec![row]);
        let ds = normalize_columns(ds);
        assert_eq!(ds.column_names, vec!["births"]);
        assert_eq!(ds.rows[0]["births"], Value::Integer(1));
    }

    #[test]
    fn missing_fields_are_listed_sorted() {
        let ds = normalize_columns(raw_dataset());
        let err = require_fields(&ds, &["Sex Of Infant", " births", "month", "state_of_residence"])
            .unwrap_err();
        assert_eq!(err.missing, vec!["month", "sex_of_infant"]);
        assert_eq!(err.available, vec!["state_of_residence", "births"]);
    }

    #[test]
    fn complete_schema_passes() {
        let ds = normalize_columns(raw_dataset());
        assert!(require_fields(&ds, &["BIRTHS", "State Of Residence"]).is_ok());
    }
}
