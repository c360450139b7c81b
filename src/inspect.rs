//! # Type Inspector
//!
//! Diagnostic report of what a worksheet holds: for every column, the
//! storage type the file declares for a few sampled cells next to the type
//! the value takes once read, plus a short preview of each value.
use crate::error::Result;
use crate::error::ResultMessage;
use crate::spreadsheet::Cell;
use crate::spreadsheet::CellType;
use crate::spreadsheet::SheetSelector;
use crate::spreadsheet::Spreadsheet;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Attribute;
use comfy_table::Cell as TableCell;
use comfy_table::Color;
use comfy_table::ContentArrangement;
use comfy_table::Table as TextTable;
use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

/// Label shown for a column without header text.
const EMPTY_HEADER: &str = "(Empty)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InspectOptions {
    /// Worksheet to inspect
    pub sheet: SheetSelector,
    /// Number of data rows sampled below the header
    pub sample_rows: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::default(),
            sample_rows: 3,
        }
    }
}

impl InspectOptions {
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<SheetSelector>) -> Self {
        self.sheet = sheet.into();
        self
    }

    #[must_use]
    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }
}

/// Findings for one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InspectionRow {
    pub header: String,
    pub declared: Vec<CellType>,
    pub runtime: Vec<&'static str>,
    pub samples: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InspectionReport {
    pub path: PathBuf,
    pub sheet: String,
    pub rows: Vec<InspectionRow>,
}

impl InspectionReport {
    /// Renders the report as a text table.
    pub fn to_text_table(&self) -> TextTable {
        let mut table = TextTable::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                header_cell("Column Header"),
                header_cell("Declared Types"),
                header_cell("Runtime Types"),
                header_cell("Data Samples"),
            ]);
        for row in &self.rows {
            let declared: Vec<&str> = row.declared.iter().map(CellType::as_str).collect();
            table.add_row(vec![
                TableCell::new(&row.header),
                TableCell::new(declared.join("/")),
                TableCell::new(row.runtime.join("/")),
                TableCell::new(row.samples.join(" | ")),
            ]);
        }
        table
    }
}

impl Display for InspectionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File: {}", self.path.display())?;
        writeln!(f, "Sheet: {}", self.sheet)?;
        write!(f, "{}", self.to_text_table())
    }
}

fn header_cell(label: &str) -> TableCell {
    TableCell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

/// Samples the first rows below the header of a worksheet.
///
/// # Errors
///
/// Any failure to open the workbook or the sheet is returned for the whole
/// file, prefixed with its path.
pub fn inspect<P>(path: P, options: &InspectOptions) -> Result<InspectionReport>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let report = sample(path, options).with_prefix(&path.display().to_string())?;
    info!(
        path = %path.display(),
        sheet = %report.sheet,
        columns = report.rows.len(),
        "inspected worksheet"
    );
    Ok(report)
}

fn sample(path: &Path, options: &InspectOptions) -> Result<InspectionReport> {
    let mut spreadsheet = Spreadsheet::open(path)?;
    let sheet = spreadsheet.open_sheet(&options.sheet, true)?;
    let first = sheet.first_data_row();
    let sampled = first..first + options.sample_rows.min(sheet.data_row_count());
    let no_nulls = HashSet::new();

    let rows = sheet
        .columns()
        .map(|column| {
            let header = sheet
                .header_cell(column)
                .and_then(Cell::header_text)
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| EMPTY_HEADER.to_owned());
            let cells: Vec<Option<&Cell>> = sampled.clone().map(|row| sheet.get(row, column)).collect();
            InspectionRow {
                header,
                declared: cells.iter().map(|cell| cell.map(|cell| cell.kind).unwrap_or_default()).collect(),
                runtime: cells
                    .iter()
                    .map(|cell| cell.map(|cell| cell.to_value(&no_nulls, false).type_name()).unwrap_or("null"))
                    .collect(),
                samples: cells
                    .iter()
                    .map(|cell| cell.map(Cell::preview).unwrap_or_else(|| "None".to_owned()))
                    .collect(),
            }
        })
        .collect();

    Ok(InspectionReport {
        path: path.to_path_buf(),
        sheet: sheet.name.clone(),
        rows,
    })
}
