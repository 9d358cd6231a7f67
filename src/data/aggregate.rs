use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Value};

/// Reduction applied to a measure column within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggOp {
    Sum,
    Mean,
    Count,
    Nunique,
}

/// `op(column)`, written to the output column `alias` (or `column` when unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reduction {
    pub column: String,
    pub op: AggOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Reduction {
    pub fn new(column: impl Into<String>, op: AggOp) -> Self {
        Reduction {
            column: column.into(),
            op,
            alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Accumulator {
    int_sum: i64,
    float_sum: f64,
    saw_float: bool,
    overflowed: bool,
    count: usize,
    distinct: BTreeSet<Value>,
}

impl Accumulator {
    fn push(&mut self, value: &Value, op: AggOp) {
        if value.is_null() {
            return;
        }
        if op == AggOp::Nunique {
            self.distinct.insert(value.clone());
            return;
        }
        self.count += 1;
        match value {
            Value::Integer(i) => {
                self.float_sum += *i as f64;
                match self.int_sum.checked_add(*i) {
                    Some(s) => self.int_sum = s,
                    None => self.overflowed = true,
                }
            }
            Value::Float(f) => {
                self.float_sum += f;
                self.saw_float = true;
            }
            // Non-numeric cells only count toward `count`.
            _ if op == AggOp::Count => {}
            _ => self.count -= 1,
        }
    }

    fn finish(&self, op: AggOp) -> Value {
        match op {
            AggOp::Sum if self.saw_float || self.overflowed => Value::from(self.float_sum),
            AggOp::Sum => Value::Integer(self.int_sum),
            AggOp::Mean if self.count == 0 => Value::Null,
            AggOp::Mean => Value::from(self.float_sum / self.count as f64),
            AggOp::Count => Value::Integer(self.count as i64),
            AggOp::Nunique => Value::Integer(self.distinct.len() as i64),
        }
    }
}

// ---------------------------------------------------------------------------
// AggregateTable
// ---------------------------------------------------------------------------

/// One output row: the key tuple and one value per reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: Vec<Value>,
    pub values: Vec<Value>,
}

/// Grouped result, sorted ascending by key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateTable {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// Position of `name` among key columns followed by value columns.
    fn position(&self, name: &str) -> Option<usize> {
        self.key_columns
            .iter()
            .chain(&self.value_columns)
            .position(|c| c == name)
    }

    /// All values of a key or value column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.position(name)?;
        let n_keys = self.key_columns.len();
        Some(
            self.rows
                .iter()
                .map(|r| {
                    if idx < n_keys {
                        &r.key[idx]
                    } else {
                        &r.values[idx - n_keys]
                    }
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Group rows by `keys` and reduce each measure per group.
///
/// Output has exactly one row per key tuple present in the input, ordered by
/// the key columns in the order given.  Nulls never contribute to a reduction.
/// With no key columns a non-empty input collapses to a single summary row.
pub fn aggregate<S: AsRef<str>>(dataset: &Dataset, keys: &[S], reductions: &[Reduction]) -> AggregateTable {
    let mut groups: BTreeMap<Vec<Value>, Vec<Accumulator>> = BTreeMap::new();

    for row in &dataset.rows {
        let key: Vec<Value> = keys
            .iter()
            .map(|k| Dataset::cell(row, k.as_ref()).clone())
            .collect();
        let accs = groups
            .entry(key)
            .or_insert_with(|| reductions.iter().map(|_| Accumulator::default()).collect());
        for (acc, red) in accs.iter_mut().zip(reductions) {
            acc.push(Dataset::cell(row, &red.column), red.op);
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, accs)| AggregateRow {
            key,
            values: accs
                .iter()
                .zip(reductions)
                .map(|(acc, red)| acc.finish(red.op))
                .collect(),
        })
        .collect();

    AggregateTable {
        key_columns: keys.iter().map(|k| k.as_ref().to_string()).collect(),
        value_columns: reductions.iter().map(|r| r.output_name().to_string()).collect(),
        rows,
    }
}

/// Reduce a measure over the whole dataset; `Null` when there are no rows.
pub fn summarize(dataset: &Dataset, reduction: &Reduction) -> Value {
    let table = aggregate::<&str>(dataset, &[], std::slice::from_ref(reduction));
    table
        .rows
        .into_iter()
        .next()
        .and_then(|r| r.values.into_iter().next())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn row(state: &str, gender: &str, births: Value) -> Row {
        [
            ("state".to_string(), Value::from(state)),
            ("gender".to_string(), Value::from(gender)),
            ("births".to_string(), births),
        ]
        .into_iter()
        .collect()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec!["state".into(), "gender".into(), "births".into()],
            vec![
                row("NY", "M", Value::Integer(5)),
                row("CA", "M", Value::Integer(10)),
                row("CA", "F", Value::Integer(20)),
            ],
        )
    }

    #[test]
    fn groups_sorted_by_keys_in_given_order() {
        let table = aggregate(&dataset(), &["state", "gender"], &[Reduction::new("births", AggOp::Sum)]);
        let got: Vec<(Value, Value, Value)> = table
            .rows
            .iter()
            .map(|r| (r.key[0].clone(), r.key[1].clone(), r.values[0].clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                (Value::from("CA"), Value::from("F"), Value::Integer(20)),
                (Value::from("CA"), Value::from("M"), Value::Integer(10)),
                (Value::from("NY"), Value::from("M"), Value::Integer(5)),
            ]
        );
        assert_eq!(table.key_columns, vec!["state", "gender"]);
        assert_eq!(table.value_columns, vec!["births"]);
    }

    #[test]
    fn group_sums_add_up_to_input_sum() {
        let mut ds = dataset();
        ds.rows.push(row("NY", "F", Value::Float(2.5)));
        ds.rows.push(row("TX", "F", Value::Null));
        let table = aggregate(&ds, &["gender"], &[Reduction::new("births", AggOp::Sum)]);
        let grouped: f64 = table.rows.iter().filter_map(|r| r.values[0].as_f64()).sum();
        let direct: f64 = ds.rows.iter().filter_map(|r| r["births"].as_f64()).sum();
        assert_eq!(grouped, direct);
        assert_eq!(grouped, 37.5);
    }

    #[test]
    fn nulls_are_excluded_from_every_reduction() {
        let ds = Dataset::new(
            vec!["state".into(), "gender".into(), "births".into()],
            vec![
                row("CA", "M", Value::Integer(4)),
                row("CA", "M", Value::Null),
                row("CA", "F", Value::Integer(4)),
                row("CA", "F", Value::Integer(8)),
                row("TX", "F", Value::Null),
            ],
        );
        let reductions = [
            Reduction::new("births", AggOp::Sum).alias("total"),
            Reduction::new("births", AggOp::Mean).alias("avg"),
            Reduction::new("births", AggOp::Count).alias("n"),
            Reduction::new("births", AggOp::Nunique).alias("distinct"),
        ];
        let table = aggregate(&ds, &["state"], &reductions);
        assert_eq!(table.value_columns, vec!["total", "avg", "n", "distinct"]);
        assert_eq!(
            table.rows[0].values,
            vec![Value::Integer(16), Value::Float(16.0 / 3.0), Value::Integer(3), Value::Integer(2)]
        );
        assert_eq!(
            table.rows[1].values,
            vec![Value::Integer(0), Value::Null, Value::Integer(0), Value::Integer(0)]
        );
    }

    #[test]
    fn column_lookup_covers_keys_and_values() {
        let table = aggregate(&dataset(), &["state"], &[Reduction::new("births", AggOp::Sum)]);
        assert_eq!(table.column("state"), Some(vec![&Value::from("CA"), &Value::from("NY")]));
        assert_eq!(table.column("births"), Some(vec![&Value::Integer(30), &Value::Integer(5)]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn summary_without_keys() {
        let ds = dataset();
        assert_eq!(summarize(&ds, &Reduction::new("births", AggOp::Sum)), Value::Integer(35));
        assert_eq!(summarize(&ds, &Reduction::new("state", AggOp::Nunique)), Value::Integer(2));
        assert_eq!(summarize(&Dataset::default(), &Reduction::new("births", AggOp::Sum)), Value::Null);
    }
}
