use crate::table::value::Value;
use std::fmt::Display;

/// Storage types a column can be persisted with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Boolean values (true/false)
    Boolean,
    /// 64-bit signed integers
    BigInt,
    /// Double-precision floating point numbers
    Double,
    /// Variable-length strings
    Varchar,
    /// Date and time with microsecond precision
    Timestamp,
    /// Date without time component
    Date,
    /// Time without date component
    Time,
}

impl ColumnType {
    /// Returns the DuckDB name of the column type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
        }
    }

    /// Detects the most specific common type of the non-null values.
    /// Falls back to VARCHAR if types are inconsistent or no value is present.
    pub fn detect<'a, I>(values: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let types: Vec<ColumnType> = values.into_iter().filter_map(Value::column_type).collect();
        if types.is_empty() {
            ColumnType::Varchar
        } else if types.iter().all(ColumnType::is_boolean) {
            ColumnType::Boolean
        } else if types.iter().all(ColumnType::is_int) {
            ColumnType::BigInt
        } else if types.iter().all(ColumnType::is_float) {
            ColumnType::Double
        } else if types.iter().all(ColumnType::is_date) {
            ColumnType::Date
        } else if types.iter().all(ColumnType::is_time) {
            ColumnType::Time
        } else if types.iter().all(ColumnType::is_datetime) {
            ColumnType::Timestamp
        } else {
            ColumnType::Varchar
        }
    }

    /// Returns true for every type except VARCHAR.
    pub const fn is_primitive(&self) -> bool {
        !matches!(self, ColumnType::Varchar)
    }

    #[inline]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, ColumnType::Boolean)
    }

    #[inline]
    pub const fn is_int(&self) -> bool {
        matches!(self, ColumnType::BigInt)
    }

    /// Integer or floating point.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, ColumnType::BigInt | ColumnType::Double)
    }

    #[inline]
    pub const fn is_date(&self) -> bool {
        matches!(self, ColumnType::Date)
    }

    #[inline]
    pub const fn is_time(&self) -> bool {
        matches!(self, ColumnType::Time)
    }

    /// Dates and timestamps; a time of day never widens to a timestamp.
    #[inline]
    pub const fn is_datetime(&self) -> bool {
        matches!(self, ColumnType::Timestamp | ColumnType::Date)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column of values.
///
/// `placeholder` marks labels the reader synthesized because the source
/// had no header for the column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    label: String,
    placeholder: bool,
    values: Vec<Value>,
}

impl Column {
    /// Creates a column with a label taken from the source.
    pub fn new(label: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            label: label.into(),
            placeholder: false,
            values,
        }
    }

    /// Creates a column whose label was synthesized by the reader.
    pub fn placeholder(label: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            label: label.into(),
            placeholder: true,
            values,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null values.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_null()).count()
    }

    /// Fraction of null values; a column without rows counts as fully missing.
    pub fn missing_fraction(&self) -> f64 {
        if self.values.is_empty() {
            1.0
        } else {
            self.missing_count() as f64 / self.values.len() as f64
        }
    }

    /// Detected storage type of the column.
    pub fn kind(&self) -> ColumnType {
        ColumnType::detect(&self.values)
    }

    /// Same values under a source label.
    pub fn renamed(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder: false,
            values: self.values,
        }
    }

    /// Same label with replaced values.
    pub fn with_values(self, values: Vec<Value>) -> Self {
        Self { values, ..self }
    }
}
