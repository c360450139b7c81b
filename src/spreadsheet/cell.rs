use crate::table::Value;
use calamine::Data;
use calamine::ExcelDateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use iso8601_duration::Duration as IsoDuration;
use std::collections::HashSet;
use std::fmt::Display;

const MICROS_PER_DAY: f64 = 86_400_000_000f64;

/// Largest magnitude below which every integral float is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992f64;

/// Characters kept by [`Cell::preview`] before truncation.
const PREVIEW_WIDTH: usize = 12;

/// Classification of a cell as the spreadsheet stores it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CellType {
    #[default]
    Empty,
    /// Text values
    Text,
    /// Numeric values
    Num,
    /// Date, time and duration values
    Date,
    /// Boolean values (true/false)
    Bool,
    /// Formula without a cached result
    Formula,
    /// Error values such as `#DIV/0!`
    Error,
    /// Anything the reader cannot classify
    Unknown,
}

impl CellType {
    /// Storage tag of a cell value; formulas are only visible when nothing was cached.
    pub fn of(value: &Data, has_formula: bool) -> Self {
        match value {
            Data::Empty if has_formula => CellType::Formula,
            Data::Empty => CellType::Empty,
            Data::String(_) => CellType::Text,
            Data::Int(_) | Data::Float(_) => CellType::Num,
            Data::Bool(_) => CellType::Bool,
            Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => CellType::Date,
            Data::Error(_) => CellType::Error,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            CellType::Empty => "Empty",
            CellType::Text => "Text",
            CellType::Num => "Num",
            CellType::Date => "Date",
            CellType::Bool => "Bool",
            CellType::Formula => "Formula",
            CellType::Error => "Error",
            CellType::Unknown => "Unknown",
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single non-empty cell of a worksheet with its position.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub column: usize,
    /// Storage classification
    pub kind: CellType,
    /// Value as read from the file
    pub value: Data,
}

impl Cell {
    pub fn new(row: usize, column: usize, value: Data, has_formula: bool) -> Self {
        Self {
            row,
            column,
            kind: CellType::of(&value, has_formula),
            value,
        }
    }

    /// Materializes the cell into a table value.
    ///
    /// Text listed in `nulls` becomes missing, integral floats become
    /// integers, and Excel serial dates become dates, times or timestamps
    /// depending on their integral and fractional parts. Error cells keep
    /// their error code text unless `error_as_null` is set.
    pub fn to_value(&self, nulls: &HashSet<String>, error_as_null: bool) -> Value {
        match &self.value {
            Data::Empty => Value::Null,
            Data::String(text) if nulls.contains(text) => Value::Null,
            Data::String(text) => Value::Text(text.to_owned()),
            Data::Int(value) => Value::Int(*value),
            Data::Float(value) if is_integral(*value) => Value::Int(*value as i64),
            Data::Float(value) => Value::Float(*value),
            Data::Bool(value) => Value::Bool(*value),
            Data::DateTime(value) => excel_datetime_to_value(value),
            Data::DateTimeIso(text) => iso_datetime_to_value(text),
            Data::DurationIso(text) => iso_duration_to_value(text),
            Data::Error(_) if error_as_null => Value::Null,
            Data::Error(error) => Value::Text(error.to_string()),
        }
    }

    /// Label text for a header cell; only a truly empty cell has none.
    pub fn header_text(&self) -> Option<String> {
        match &self.value {
            Data::Empty => None,
            Data::String(text) => Some(text.to_owned()),
            _ => self.to_value(&HashSet::new(), false).to_text(),
        }
    }

    /// Short rendering of the raw value for previews.
    ///
    /// Empty cells read as "None" and blank text as "Empty"; anything longer
    /// than twelve characters is cut and suffixed with "..".
    pub fn preview(&self) -> String {
        match &self.value {
            Data::Empty => "None".to_owned(),
            Data::String(text) if text.is_empty() => "Empty".to_owned(),
            _ => truncate(&self.to_value(&HashSet::new(), false).to_string()),
        }
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > PREVIEW_WIDTH {
        let head: String = text.chars().take(PREVIEW_WIDTH).collect();
        format!("{head}..")
    } else {
        text.to_owned()
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER
}

/// Converts a fraction of a day into a time of day.
fn fraction_to_time(fraction: f64) -> Option<NaiveTime> {
    let micros = (fraction * MICROS_PER_DAY).round() as i64;
    if !(0..MICROS_PER_DAY as i64).contains(&micros) {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt(
        (micros / 1_000_000) as u32,
        ((micros % 1_000_000) * 1_000) as u32,
    )
}

fn excel_datetime_to_value(value: &ExcelDateTime) -> Value {
    let serial = value.as_f64();
    if value.is_duration() || serial < 1.0 {
        return fraction_to_time(serial)
            .map(Value::Time)
            .unwrap_or(Value::Float(serial));
    }
    match value.as_datetime() {
        Some(datetime) if serial.fract() == 0.0 => Value::Date(datetime.date()),
        Some(datetime) => Value::DateTime(datetime),
        None => Value::Float(serial),
    }
}

fn iso_datetime_to_value(text: &str) -> Value {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        Value::DateTime(datetime)
    } else if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Value::Date(date)
    } else if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
        Value::Time(time)
    } else {
        Value::Text(text.to_owned())
    }
}

/// Durations shorter than a day read as a time of day, longer ones stay text.
fn iso_duration_to_value(text: &str) -> Value {
    let Ok(duration) = text.parse::<IsoDuration>() else {
        return Value::Text(text.to_owned());
    };
    if duration.year != 0.0 || duration.month != 0.0 || duration.day != 0.0 {
        return Value::Text(text.to_owned());
    }
    let seconds = duration.hour as f64 * 3600.0 + duration.minute as f64 * 60.0 + duration.second as f64;
    fraction_to_time(seconds / 86_400.0)
        .map(Value::Time)
        .unwrap_or_else(|| Value::Text(text.to_owned()))
}
