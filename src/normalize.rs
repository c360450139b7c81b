//! # Column Normalizer
//!
//! Cleans a freshly read table before it is persisted:
//!
//! 1. Placeholder columns (no header in the source) that are entirely or
//!    almost entirely missing are dropped.
//! 2. Surviving placeholder columns are relabelled `Column_1`, `Column_2`, ...
//! 3. Columns that do not hold one uniform primitive type are coerced to
//!    text, turning missing-value sentinels such as `"nan"` into nulls.
//!
//! Column order, row count and row alignment are preserved, and running the
//! normalizer on its own output changes nothing.
use crate::table::Column;
use crate::table::Table;
use crate::table::Value;
use std::collections::HashSet;
use tracing::debug;

/// Tuning knobs of the normalizer.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizeOptions {
    /// Placeholder columns whose missing fraction exceeds this are dropped
    pub missing_threshold: f64,
    /// Text values treated as missing when a column is coerced to text
    pub missing_sentinels: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            missing_threshold: 0.95,
            missing_sentinels: vec!["nan".to_owned(), "None".to_owned()],
        }
    }
}

impl NormalizeOptions {
    #[must_use]
    pub fn with_missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_missing_sentinels<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_sentinels = sentinels.into_iter().map(Into::into).collect();
        self
    }
}

/// What happens to one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Drop,
    Keep {
        /// New label, if the column is relabelled
        rename: Option<String>,
        /// Whether every value is replaced by its text representation
        coerce: bool,
    },
}

/// Normalizes a table with the default options.
pub fn normalize(table: &Table) -> Table {
    normalize_with(table, &NormalizeOptions::default())
}

/// Normalizes a table, returning a new one.
pub fn normalize_with(table: &Table, options: &NormalizeOptions) -> Table {
    let sentinels: HashSet<&str> = options.missing_sentinels.iter().map(String::as_str).collect();
    let columns = table
        .columns()
        .iter()
        .zip(plan(table, options))
        .filter_map(|(column, decision)| match decision {
            Decision::Drop => None,
            Decision::Keep { rename, coerce } => {
                let column = match rename {
                    Some(label) => column.clone().renamed(label),
                    None => column.clone(),
                };
                Some(if coerce { coerce_to_text(column, &sentinels) } else { column })
            }
        })
        .collect();
    Table::from_aligned(table.row_count(), columns)
}

/// Decides the fate of every column, in column order.
///
/// Output labels are unique without regard to case and never blank, so the
/// writer can store every kept column under its label.
pub fn plan(table: &Table, options: &NormalizeOptions) -> Vec<Decision> {
    // Labels a generated one must not collide with.
    let reserved: HashSet<String> = table
        .columns()
        .iter()
        .filter(|column| !column.is_placeholder())
        .map(|column| column.label().to_lowercase())
        .collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut counter = 0usize;

    table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let missing = column.missing_fraction();
            if column.is_placeholder() && (missing >= 1.0 || missing > options.missing_threshold) {
                debug!(column = column.label(), missing, "drop mostly empty placeholder column");
                return Decision::Drop;
            }

            let label = if column.is_placeholder() {
                loop {
                    counter += 1;
                    let candidate = format!("Column_{counter}");
                    if is_free(&candidate, &reserved, &used) {
                        break candidate;
                    }
                }
            } else if column.label().is_empty() {
                first_free(&format!("Unnamed: {index}"), &reserved, &used)
            } else if used.contains(&column.label().to_lowercase()) {
                first_free(column.label(), &reserved, &used)
            } else {
                column.label().to_owned()
            };
            used.insert(label.to_lowercase());
            let rename = (label != column.label()).then_some(label);

            let kind = column.kind();
            let coerce = !kind.is_primitive();
            debug!(
                column = column.label(),
                rename = rename.as_deref(),
                %kind,
                coerce,
                "keep column"
            );
            Decision::Keep { rename, coerce }
        })
        .collect()
}

fn is_free(candidate: &str, reserved: &HashSet<String>, used: &HashSet<String>) -> bool {
    let key = candidate.to_lowercase();
    !reserved.contains(&key) && !used.contains(&key)
}

/// First of `base`, `base.1`, `base.2`, ... that no other column claims.
fn first_free(base: &str, reserved: &HashSet<String>, used: &HashSet<String>) -> String {
    std::iter::once(base.to_owned())
        .chain((1..).map(|suffix| format!("{base}.{suffix}")))
        .find(|candidate| is_free(candidate, reserved, used))
        .unwrap_or_default()
}

fn coerce_to_text(column: Column, sentinels: &HashSet<&str>) -> Column {
    let values = column
        .values()
        .iter()
        .map(|value| match value.to_text() {
            Some(text) if sentinels.contains(text.as_str()) => Value::Null,
            Some(text) => Value::Text(text),
            None => Value::Null,
        })
        .collect();
    column.with_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nulls(count: usize) -> Vec<Value> {
        vec![Value::Null; count]
    }

    fn names() -> Column {
        Column::new(
            "Name",
            vec!["Ann", "Bob", "Cid", "Dee", "Eve"].into_iter().map(Value::from).collect(),
        )
    }

    #[test]
    fn drop_empty_placeholder() {
        let ages: Vec<Value> = (30..35).map(Value::Int).collect();
        let table = Table::new(vec![
            names(),
            Column::placeholder("Unnamed: 1", nulls(5)),
            Column::new("Age", ages.clone()),
        ])
        .unwrap();

        let cleaned = normalize(&table);
        assert_eq!(cleaned.labels(), vec!["Name", "Age"]);
        assert_eq!(cleaned.row_count(), 5);
        assert_eq!(cleaned.column("Age").unwrap().values(), ages.as_slice());
        assert_eq!(cleaned.column("Name"), table.column("Name"));
    }

    #[test]
    fn rename_sparse_placeholder() {
        let mut values = nulls(5);
        values[0] = Value::from("x");
        let table = Table::new(vec![names(), Column::placeholder("Unnamed: 1", values)]).unwrap();

        let cleaned = normalize(&table);
        assert_eq!(cleaned.labels(), vec!["Name", "Column_1"]);
        assert!(!cleaned.columns()[1].is_placeholder());
        assert_eq!(cleaned.columns()[1].values()[0], Value::from("x"));
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut values = nulls(20);
        values[0] = Value::Int(1);
        let table = Table::new(vec![Column::placeholder("Unnamed: 0", values)]).unwrap();
        // 19 of 20 missing is exactly 0.95, which is kept.
        assert_eq!(normalize(&table).labels(), vec!["Column_1"]);

        let stricter = NormalizeOptions::default().with_missing_threshold(0.9);
        assert!(normalize_with(&table, &stricter).labels().is_empty());
    }

    #[test]
    fn placeholders_are_numbered_among_survivors() {
        let table = Table::new(vec![
            Column::placeholder("Unnamed: 0", vec![Value::Int(1), Value::Int(2)]),
            Column::placeholder("Unnamed: 1", nulls(2)),
            Column::new("Column_2", vec![Value::Int(3), Value::Int(4)]),
            Column::placeholder("Unnamed: 3", vec![Value::Int(5), Value::Null]),
        ])
        .unwrap();
        let cleaned = normalize(&table);
        assert_eq!(cleaned.labels(), vec!["Column_1", "Column_2", "Column_3"]);
        assert_eq!(cleaned.columns()[2].values(), &[Value::Int(5), Value::Null]);
    }

    #[test]
    fn duplicate_labels_are_made_unique() {
        let table = Table::new(vec![
            Column::new("id", vec![Value::Int(1)]),
            Column::new("id", vec![Value::Int(2)]),
        ])
        .unwrap();
        assert_eq!(normalize(&table).labels(), vec!["id", "id.1"]);
    }

    #[test]
    fn labels_differing_in_case_are_made_unique() {
        let table = Table::new(vec![
            Column::new("Name", vec![Value::from("a")]),
            Column::new("name", vec![Value::from("b")]),
            Column::new("NAME.1", vec![Value::from("c")]),
        ])
        .unwrap();
        assert_eq!(normalize(&table).labels(), vec!["Name", "name.2", "NAME.1"]);
    }

    #[test]
    fn blank_labels_are_named() {
        let table = Table::new(vec![
            Column::new("", vec![Value::Int(1)]),
            Column::new("Unnamed: 0", vec![Value::Int(2)]),
            Column::new("", vec![Value::Int(3)]),
        ])
        .unwrap();
        let cleaned = normalize(&table);
        assert_eq!(cleaned.labels(), vec!["Unnamed: 0.1", "Unnamed: 0", "Unnamed: 2"]);
        assert_eq!(normalize(&cleaned), cleaned);
    }

    #[test]
    fn sentinels_become_null_in_text_columns() {
        let table = Table::new(vec![Column::new(
            "city",
            vec![Value::from("Oslo"), Value::from("nan"), Value::from("None"), Value::Null],
        )])
        .unwrap();
        let cleaned = normalize(&table);
        assert_eq!(
            cleaned.columns()[0].values(),
            &[Value::from("Oslo"), Value::Null, Value::Null, Value::Null]
        );
    }

    #[test]
    fn mixed_columns_are_coerced_to_text() {
        let table = Table::new(vec![
            Column::new("mixed", vec![Value::Int(1), Value::from("two"), Value::Bool(true)]),
            Column::new("numbers", vec![Value::Int(1), Value::Float(2.5), Value::Null]),
        ])
        .unwrap();
        let cleaned = normalize(&table);
        assert_eq!(
            cleaned.columns()[0].values(),
            &[Value::from("1"), Value::from("two"), Value::from("true")]
        );
        assert_eq!(cleaned.columns()[1], table.columns()[1]);

        let decisions = plan(&table, &NormalizeOptions::default());
        assert_eq!(
            decisions,
            vec![
                Decision::Keep { rename: None, coerce: true },
                Decision::Keep { rename: None, coerce: false },
            ]
        );
    }

    #[test]
    fn zero_rows_drop_every_placeholder() {
        let table = Table::with_rows(
            0,
            vec![Column::placeholder("Unnamed: 0", Vec::new()), Column::new("a", Vec::new())],
        )
        .unwrap();
        let cleaned = normalize(&table);
        assert_eq!(cleaned.labels(), vec!["a"]);
        assert_eq!(cleaned.row_count(), 0);
    }

    #[test]
    fn normalize_is_idempotent() {
        let table = Table::new(vec![
            Column::placeholder("Unnamed: 0", vec![Value::from("a"), Value::Int(1), Value::from("nan")]),
            Column::placeholder("Unnamed: 1", nulls(3)),
            Column::new("score", vec![Value::Float(1.5), Value::Null, Value::Int(2)]),
            Column::new("note", vec![Value::from("None"), Value::from("ok"), Value::Null]),
        ])
        .unwrap();
        let once = normalize(&table);
        let twice = normalize(&once);
        assert_eq!(once, twice);
        assert_eq!(once.row_count(), table.row_count());
    }
}
