//! # Table Module
//!
//! In-memory tabular model shared by the reader, the normalizer and the
//! columnar writer: an ordered list of labelled columns whose values are
//! aligned by row index.
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

pub mod column;
pub mod value;

pub use column::Column;
pub use column::ColumnType;
pub use value::Value;

/// Errors raised while assembling a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{label}' has {actual} values, expected {expected}")]
    RaggedColumn {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Date-time layouts accepted when parsing text columns as dates.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%d/%m/%Y %H:%M:%S"];

/// Date layouts accepted when parsing text columns as dates.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Ordered columns with a uniform row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table whose row count is taken from the first column.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        Self::with_rows(rows, columns)
    }

    /// Builds a table with an explicit row count, which also holds when no column survives.
    pub fn with_rows(rows: usize, columns: Vec<Column>) -> Result<Self, TableError> {
        if let Some(column) = columns.iter().find(|column| column.len() != rows) {
            Err(TableError::RaggedColumn {
                label: column.label().to_owned(),
                expected: rows,
                actual: column.len(),
            })?
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from columns already known to hold `rows` values each.
    pub(crate) fn from_aligned(rows: usize, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|column| column.len() == rows));
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks a column up by label.
    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.label() == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(Column::label).collect()
    }

    /// Values of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index < self.rows {
            Some(self.columns.iter().map(|column| &column.values()[index]).collect())
        } else {
            None
        }
    }

    /// Label and detected storage type of every column.
    pub fn schema(&self) -> Vec<(&str, ColumnType)> {
        self.columns.iter().map(|column| (column.label(), column.kind())).collect()
    }

    /// Returns a table where the named text columns are parsed as dates.
    ///
    /// A column is converted only when every non-null text value parses;
    /// otherwise it is kept unchanged.
    pub fn with_parsed_dates<S: AsRef<str>>(self, names: &[S]) -> Table {
        for name in names {
            if self.column(name.as_ref()).is_none() {
                warn!(column = name.as_ref(), "date column not found, ignoring");
            }
        }
        let rows = self.rows;
        let columns = self
            .columns
            .into_iter()
            .map(|column| {
                if !names.iter().any(|name| name.as_ref() == column.label()) {
                    return column;
                }
                match parse_dates(column.values()) {
                    Some(values) => {
                        debug!(column = column.label(), "parsed column as dates");
                        column.with_values(values)
                    }
                    None => {
                        warn!(column = column.label(), "column holds values that are not dates, left unchanged");
                        column
                    }
                }
            })
            .collect();
        Table { columns, rows }
    }
}

/// Parses every text value as a date or date-time, or gives up.
fn parse_dates(values: &[Value]) -> Option<Vec<Value>> {
    values
        .iter()
        .map(|value| match value {
            Value::Text(text) => parse_date(text.trim()),
            Value::Null | Value::Date(_) | Value::DateTime(_) => Some(value.to_owned()),
            _ => None,
        })
        .collect()
}

fn parse_date(text: &str) -> Option<Value> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(Value::DateTime)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(Value::Date)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_columns_are_rejected() {
        let result = Table::new(vec![
            Column::new("a", vec![Value::Int(1), Value::Int(2)]),
            Column::new("b", vec![Value::Int(1)]),
        ]);
        assert!(matches!(
            result,
            Err(TableError::RaggedColumn { ref label, expected: 2, actual: 1 }) if label == "b"
        ));
    }

    #[test]
    fn empty_table_keeps_row_count() {
        let table = Table::with_rows(4, Vec::new()).unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row(0), Some(Vec::new()));
        assert_eq!(table.row(4), None);
    }

    #[test]
    fn rows_follow_column_order() {
        let table = Table::new(vec![
            Column::new("a", vec![Value::Int(1), Value::Int(2)]),
            Column::new("b", vec![Value::from("x"), Value::Null]),
        ])
        .unwrap();
        assert_eq!(table.row(1), Some(vec![&Value::Int(2), &Value::Null]));
        assert_eq!(table.labels(), vec!["a", "b"]);
    }

    #[test]
    fn parse_date_columns() {
        let table = Table::new(vec![
            Column::new("when", vec![Value::from("2024-01-31"), Value::Null, Value::from("2024-02-01 10:30:00")]),
            Column::new("note", vec![Value::from("2024-01-31"), Value::from("soon"), Value::Null]),
        ])
        .unwrap();
        let parsed = table.with_parsed_dates(&["when", "note", "missing"]);

        let when = parsed.column("when").unwrap();
        assert_eq!(when.values()[0], Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert_eq!(when.values()[1], Value::Null);
        assert_eq!(when.kind(), ColumnType::Timestamp);

        let note = parsed.column("note").unwrap();
        assert_eq!(note.values()[0], Value::from("2024-01-31"));
        assert_eq!(note.kind(), ColumnType::Varchar);
    }
}
