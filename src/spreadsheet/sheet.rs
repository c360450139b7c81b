use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::options::ReadOptions;
use crate::spreadsheet::range::Range;
use crate::spreadsheet::reference::cell_position;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Column;
use crate::table::Table;
use crate::table::TableError;
use calamine::Data;
use std::collections::HashMap;
use std::collections::HashSet;

/// A label derived from the header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderLabel {
    pub text: String,
    /// Synthesized because the header cell was empty or absent
    pub placeholder: bool,
}

/// A worksheet's used cells with their boundaries.
#[derive(Debug)]
pub struct Sheet {
    /// Sheet name inside the workbook
    pub name: String,
    /// Whether the first row holds column labels
    pub with_header: bool,
    /// Starting row index (0-based, inclusive)
    pub row_lower_bound: usize,
    /// Ending row index (0-based, inclusive)
    pub row_upper_bound: usize,
    /// Starting column index (0-based, inclusive)
    pub column_lower_bound: usize,
    /// Ending column index (0-based, inclusive)
    pub column_upper_bound: usize,
    cells: Vec<Cell>,
    indexes: HashMap<(usize, usize), usize>,
}

impl Sheet {
    /// Collects the used cells of a value range, marking cells that carry a formula.
    ///
    /// Formula cells without a cached value are kept so that they show up
    /// as such instead of vanishing with the other empty cells.
    pub fn from_range(
        name: &str,
        with_header: bool,
        values: &calamine::Range<Data>,
        formulas: Option<&calamine::Range<String>>,
    ) -> Result<Sheet, SpreadsheetError> {
        let mut formula_positions: HashSet<(usize, usize)> = HashSet::new();
        if let Some((formulas, (row_start, column_start))) = formulas.and_then(|range| Some((range, range.start()?))) {
            for (row, column, formula) in formulas.used_cells() {
                if !formula.is_empty() {
                    formula_positions.insert((row_start as usize + row, column_start as usize + column));
                }
            }
        }

        let mut cells: Vec<Cell> = Vec::new();
        let mut indexes: HashMap<(usize, usize), usize> = HashMap::new();
        if let Some((row_start, column_start)) = values.start() {
            for (row, column, value) in values.used_cells() {
                let position = (row_start as usize + row, column_start as usize + column);
                indexes.insert(position, cells.len());
                cells.push(Cell::new(
                    position.0,
                    position.1,
                    value.to_owned(),
                    formula_positions.contains(&position),
                ));
            }
        }
        for position in formula_positions {
            if let std::collections::hash_map::Entry::Vacant(entry) = indexes.entry(position) {
                entry.insert(cells.len());
                cells.push(Cell::new(position.0, position.1, Data::Empty, true));
            }
        }

        if cells.is_empty() {
            Err(SpreadsheetError::EmptySheet {
                sheet: name.to_owned(),
            })?
        }
        Ok(Sheet {
            name: name.to_owned(),
            with_header,
            row_lower_bound: cells.iter().map(|cell| cell.row).min().unwrap_or_default(),
            row_upper_bound: cells.iter().map(|cell| cell.row).max().unwrap_or_default(),
            column_lower_bound: cells.iter().map(|cell| cell.column).min().unwrap_or_default(),
            column_upper_bound: cells.iter().map(|cell| cell.column).max().unwrap_or_default(),
            cells,
            indexes,
        })
    }

    /// Narrows the sheet boundaries to a range; unbounded sides keep the used area.
    pub fn restrict(&mut self, range: &Range) {
        if let Some(row) = range.row_lower_bound {
            self.row_lower_bound = row;
        }
        if let Some(row) = range.row_upper_bound {
            self.row_upper_bound = row;
        }
        if let Some(column) = range.col_lower_bound {
            self.column_lower_bound = column;
        }
        if let Some(column) = range.col_upper_bound {
            self.column_upper_bound = column;
        }
    }

    /// Gets the cell at a position inside the sheet boundaries.
    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        if self.row_lower_bound <= row
            && row <= self.row_upper_bound
            && self.column_lower_bound <= column
            && column <= self.column_upper_bound
        {
            self.indexes
                .get(&(row, column))
                .and_then(|index| self.cells.get(*index))
        } else {
            None
        }
    }

    /// Excel-style reference of the area inside the boundaries, e.g. "A1:F4".
    pub fn area(&self) -> String {
        format!(
            "{}:{}",
            cell_position(self.row_lower_bound, self.column_lower_bound),
            cell_position(self.row_upper_bound, self.column_upper_bound)
        )
    }

    /// Column indexes inside the boundaries.
    pub fn columns(&self) -> std::ops::RangeInclusive<usize> {
        self.column_lower_bound..=self.column_upper_bound
    }

    /// First row holding data rather than labels.
    pub fn first_data_row(&self) -> usize {
        self.row_lower_bound + usize::from(self.with_header)
    }

    /// Number of data rows inside the boundaries.
    pub fn data_row_count(&self) -> usize {
        (self.row_upper_bound + 1).saturating_sub(self.first_data_row())
    }

    /// Cell of the header row for a column, if the sheet has a header.
    pub fn header_cell(&self, column: usize) -> Option<&Cell> {
        if self.with_header {
            self.get(self.row_lower_bound, column)
        } else {
            None
        }
    }

    /// Column labels, one per column inside the boundaries.
    ///
    /// Missing header cells produce "Unnamed: <offset>" placeholders; a
    /// sheet read without header gets "column1", "column2", ... instead.
    /// Repeated labels are made unique with ".1", ".2", ... suffixes.
    pub fn header(&self) -> Vec<HeaderLabel> {
        let labels = self.columns().enumerate().map(|(offset, column)| {
            if !self.with_header {
                return HeaderLabel {
                    text: format!("column{}", offset + 1),
                    placeholder: true,
                };
            }
            match self.header_cell(column).and_then(Cell::header_text) {
                Some(text) => HeaderLabel {
                    text,
                    placeholder: false,
                },
                None => HeaderLabel {
                    text: format!("Unnamed: {offset}"),
                    placeholder: true,
                },
            }
        });
        mangle_duplicates(labels.collect())
    }

    /// Materializes the data rows into a table.
    pub fn to_table(&self, options: &ReadOptions) -> Result<Table, TableError> {
        let rows = self.first_data_row()..=self.row_upper_bound;
        let columns = self
            .header()
            .into_iter()
            .zip(self.columns())
            .map(|(label, column)| {
                let values = rows
                    .clone()
                    .map(|row| {
                        self.get(row, column)
                            .map(|cell| cell.to_value(&options.nulls, options.error_as_null))
                            .unwrap_or_default()
                    })
                    .collect();
                if label.placeholder {
                    Column::placeholder(label.text, values)
                } else {
                    Column::new(label.text, values)
                }
            })
            .collect();
        Table::with_rows(self.data_row_count(), columns)
    }
}

/// Makes labels unique with ".1", ".2", ... suffixes. Labels read from the
/// header row are settled first so a placeholder never displaces them.
fn mangle_duplicates(mut labels: Vec<HeaderLabel>) -> Vec<HeaderLabel> {
    let mut seen: HashSet<String> = HashSet::new();
    for placeholder in [false, true] {
        for label in labels.iter_mut().filter(|label| label.placeholder == placeholder) {
            if seen.contains(&label.text) {
                label.text = (1..)
                    .map(|suffix| format!("{}.{suffix}", label.text))
                    .find(|candidate| !seen.contains(candidate))
                    .unwrap_or_default();
            }
            seen.insert(label.text.clone());
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn sheet(with_header: bool, rows: Vec<Vec<Data>>) -> Sheet {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut range = calamine::Range::new((0, 0), (height - 1, width - 1));
        for (row, values) in rows.into_iter().enumerate() {
            for (column, value) in values.into_iter().enumerate() {
                range.set_value((row as u32, column as u32), value);
            }
        }
        Sheet::from_range("Sheet1", with_header, &range, None).unwrap()
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_owned())
    }

    #[test]
    fn header_placeholders_and_duplicates() {
        let sheet = sheet(
            true,
            vec![
                vec![text("id"), Data::Empty, text("id"), text(""), text("id")],
                vec![Data::Int(1), Data::Int(2), Data::Int(3), Data::Int(4), Data::Int(5)],
            ],
        );
        let labels: Vec<(String, bool)> = sheet
            .header()
            .into_iter()
            .map(|label| (label.text, label.placeholder))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("id".to_owned(), false),
                ("Unnamed: 1".to_owned(), true),
                ("id.1".to_owned(), false),
                ("".to_owned(), false),
                ("id.2".to_owned(), false),
            ]
        );
    }

    #[test]
    fn header_labels_win_over_placeholders() {
        let sheet = sheet(
            true,
            vec![
                vec![Data::Empty, text("Unnamed: 0")],
                vec![Data::Int(1), Data::Int(2)],
            ],
        );
        let header = sheet.header();
        assert_eq!(
            header,
            vec![
                HeaderLabel {
                    text: "Unnamed: 0.1".to_owned(),
                    placeholder: true,
                },
                HeaderLabel {
                    text: "Unnamed: 0".to_owned(),
                    placeholder: false,
                },
            ]
        );

        let table = sheet.to_table(&ReadOptions::default()).unwrap();
        let cleaned = crate::normalize::normalize(&table);
        assert_eq!(cleaned.labels(), vec!["Column_1", "Unnamed: 0"]);
    }

    #[test]
    fn area_reference() {
        let mut sheet = sheet(true, vec![vec![text("a"), text("b")], vec![Data::Int(1), Data::Int(2)]]);
        assert_eq!(sheet.area(), "A1:B2");
        sheet.restrict(&"B:C".parse().unwrap());
        assert_eq!(sheet.area(), "B1:C2");
    }

    #[test]
    fn table_without_header() {
        let sheet = sheet(false, vec![vec![text("a"), Data::Float(1.5)], vec![text("b"), Data::Empty]]);
        let table = sheet.to_table(&ReadOptions::default().with_header(false)).unwrap();
        assert_eq!(table.labels(), vec!["column1", "column2"]);
        assert!(table.columns().iter().all(Column::is_placeholder));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.row(1), Some(vec![&Value::from("b"), &Value::Null]));
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let sheet = sheet(true, vec![vec![text("a"), text("b")]]);
        let table = sheet.to_table(&ReadOptions::default()).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn restricted_range() {
        let mut sheet = sheet(
            true,
            vec![
                vec![text("skip"), text("skip"), text("skip")],
                vec![text("x"), text("a"), text("b")],
                vec![Data::Int(0), Data::Int(1), Data::Int(2)],
            ],
        );
        sheet.restrict(&"B2:C3".parse().unwrap());
        let table = sheet.to_table(&ReadOptions::default()).unwrap();
        assert_eq!(table.labels(), vec!["a", "b"]);
        assert_eq!(table.row(0), Some(vec![&Value::Int(1), &Value::Int(2)]));
    }

    #[test]
    fn formula_without_cached_value() {
        let mut values = calamine::Range::new((0, 0), (1, 0));
        values.set_value((0, 0), text("total"));
        let mut formulas = calamine::Range::new((0, 0), (1, 1));
        formulas.set_value((1, 0), "SUM(B1:B9)".to_owned());
        formulas.set_value((1, 1), "A2*2".to_owned());
        let sheet = Sheet::from_range("Sheet1", true, &values, Some(&formulas)).unwrap();
        assert_eq!(sheet.column_upper_bound, 1);
        let cell = sheet.get(1, 0).unwrap();
        assert_eq!(cell.kind, crate::spreadsheet::cell::CellType::Formula);
        assert_eq!(cell.preview(), "None");
    }

    #[test]
    fn empty_range_is_rejected() {
        let range: calamine::Range<Data> = calamine::Range::empty();
        assert!(matches!(
            Sheet::from_range("Blank", true, &range, None),
            Err(SpreadsheetError::EmptySheet { .. })
        ));
    }
}
