use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Value};
use crate::error::EmptyResultWarning;

// ---------------------------------------------------------------------------
// Selection: what a multi-select control currently restricts a column to
// ---------------------------------------------------------------------------

/// One entry picked in a multi-select control.  `All` is synthetic and never
/// collides with a data value, even a cell that literally reads "All".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Choice {
    All,
    Value(Value),
}

/// Per-column restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// No restriction.
    #[default]
    All,
    /// Keep rows whose value is one of these.  Never empty.
    Subset(BTreeSet<Value>),
    /// Nothing selected: no row passes.
    Empty,
}

impl Selection {
    /// Build a selection from control choices.
    ///
    /// * any `All` among the choices → no restriction, even next to concrete values
    /// * no choices at all → [`Selection::Empty`]
    pub fn from_choices<I: IntoIterator<Item = Choice>>(choices: I) -> Self {
        let mut values = BTreeSet::new();
        for choice in choices {
            match choice {
                Choice::All => return Selection::All,
                Choice::Value(v) => {
                    values.insert(v);
                }
            }
        }
        Selection::subset(values)
    }

    /// A concrete set of values; an empty set means nothing is selected.
    pub fn subset<I: IntoIterator<Item = Value>>(values: I) -> Self {
        let values: BTreeSet<Value> = values.into_iter().collect();
        if values.is_empty() {
            Selection::Empty
        } else {
            Selection::Subset(values)
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Selection::All => true,
            Selection::Subset(values) => values.contains(value),
            Selection::Empty => false,
        }
    }
}

/// A selection bound to the column it restricts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub column: String,
    pub selection: Selection,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, selection: Selection) -> Self {
        FilterSpec {
            column: column.into(),
            selection,
        }
    }
}

/// A filterable dimension as offered in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDimension {
    pub column: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Sorted, non-null distinct values of `column`: the options of its control
/// (the UI prepends `All`).
pub fn distinct_values(dataset: &Dataset, column: &str) -> BTreeSet<Value> {
    dataset
        .rows
        .iter()
        .map(|row| Dataset::cell(row, column))
        .filter(|v| !v.is_null())
        .cloned()
        .collect()
}

/// Indices of rows passing every filter.
///
/// A row passes a column filter when:
/// * the selection is `All` → passes (no constraint)
/// * the selection is `Empty` → nothing selected → fails
/// * the row's value for that column is in the selected set → passes
///   (a row lacking the column is null and never matches a subset)
pub fn filtered_indices(dataset: &Dataset, filters: &[FilterSpec]) -> Vec<usize> {
    dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            filters
                .iter()
                .all(|f| f.selection.matches(Dataset::cell(row, &f.column)))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Restrict `dataset` to rows matching `selection` on `column`.
pub fn apply_filter(dataset: &Dataset, column: &str, selection: &Selection) -> Dataset {
    match selection {
        Selection::All => dataset.clone(),
        _ => dataset.select_rows(&filtered_indices(
            dataset,
            &[FilterSpec::new(column, selection.clone())],
        )),
    }
}

/// Conjunction of every filter.  Each is an independent row predicate, so the
/// order of `filters` does not affect the result.
pub fn apply_filters(dataset: &Dataset, filters: &[FilterSpec]) -> Dataset {
    dataset.select_rows(&filtered_indices(dataset, filters))
}

/// [`apply_filters`] plus the post-condition: a selection that leaves no rows
/// yields [`EmptyResultWarning`].
pub fn filter_rows(dataset: &Dataset, filters: &[FilterSpec]) -> Result<Dataset, EmptyResultWarning> {
    let filtered = apply_filters(dataset, filters);
    if filtered.is_empty() {
        log::warn!("{}", EmptyResultWarning);
        return Err(EmptyResultWarning);
    }
    Ok(filtered)
}
