use crate::spreadsheet::range::Range;
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

/// Selects a worksheet either by 0-based position or by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl FromStr for SheetSelector {
    type Err = std::convert::Infallible;

    /// Digits select by position; anything else selects by name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.parse::<usize>() {
            Ok(index) => SheetSelector::Index(index),
            Err(_) => SheetSelector::Name(value.to_owned()),
        })
    }
}

impl Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSelector::Index(index) => write!(f, "#{index}"),
            SheetSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        SheetSelector::Index(index)
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_owned())
    }
}

/// How a worksheet is turned into a table.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadOptions {
    /// Worksheet to read
    pub sheet: SheetSelector,
    /// Whether the first row of the range holds column labels
    pub header: bool,
    /// Optional cell range restricting what is read
    pub range: Option<Range>,
    /// Text values treated as missing
    pub nulls: HashSet<String>,
    /// Whether error cells become missing instead of their error code text
    pub error_as_null: bool,
    /// Text columns parsed as dates after reading
    pub date_columns: Vec<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::default(),
            header: true,
            range: None,
            nulls: HashSet::from([String::new()]),
            error_as_null: false,
            date_columns: Vec::new(),
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<SheetSelector>) -> Self {
        self.sheet = sheet.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    #[must_use]
    pub fn with_nulls<I, S>(mut self, nulls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nulls = nulls.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_error_as_null(mut self, error_as_null: bool) -> Self {
        self.error_as_null = error_as_null;
        self
    }

    #[must_use]
    pub fn with_date_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_from_text() {
        assert_eq!("2".parse::<SheetSelector>().unwrap(), SheetSelector::Index(2));
        assert_eq!(
            "Sales 2024".parse::<SheetSelector>().unwrap(),
            SheetSelector::Name("Sales 2024".to_owned())
        );
    }

    #[test]
    fn defaults() {
        let options = ReadOptions::default();
        assert_eq!(options.sheet, SheetSelector::Index(0));
        assert!(options.header);
        assert!(options.nulls.contains(""));
        assert!(!options.error_as_null);
    }
}
