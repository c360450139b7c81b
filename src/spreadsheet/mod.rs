//! # Spreadsheet Module
//!
//! Reads Excel (.xlsx, .xlsm, .xlam, .xlsb, .xls, .xla) and OpenDocument
//! (.ods) workbooks through calamine and turns a worksheet into a
//! [`Table`](crate::table::Table).
use crate::error::Result;
use crate::table::Table;
use calamine::open_workbook;
use calamine::Data;
use calamine::Ods;
use calamine::OdsError;
use calamine::Reader;
use calamine::Xls;
use calamine::XlsError;
use calamine::Xlsb;
use calamine::XlsbError;
use calamine::Xlsx;
use calamine::XlsxError;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub mod cell;
pub mod options;
pub mod range;
pub mod reference;
pub mod sheet;

pub use cell::Cell;
pub use cell::CellType;
pub use options::ReadOptions;
pub use options::SheetSelector;
pub use range::Range;
pub use sheet::Sheet;

/// Errors raised while opening a workbook or one of its sheets.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Error in Excel 2007+ format (.xlsx, .xlsm, .xlam)
    #[error("Invalid xlsx file format: {0}")]
    InvalidXlsxFileFormat(#[from] XlsxError),

    /// Error in Excel Binary format (.xlsb)
    #[error("Invalid xlsb file format: {0}")]
    InvalidXlsbFileFormat(#[from] XlsbError),

    /// Error in legacy Excel format (.xls, .xla)
    #[error("Invalid xls file format: {0}")]
    InvalidXlsFileFormat(#[from] XlsError),

    /// Error in OpenDocument format (.ods)
    #[error("Invalid ods file format: {0}")]
    InvalidOdsFileFormat(#[from] OdsError),

    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },

    #[error("Sheet {sheet} not found")]
    SheetNotFound { sheet: String },

    #[error("Sheet '{sheet}' is empty")]
    EmptySheet { sheet: String },
}

pub type FileReader = BufReader<File>;

/// Wrapper over the calamine readers of every supported format.
pub enum Spreadsheet {
    /// Excel 2007+ format reader (.xlsx, .xlsm, .xlam)
    Xlsx(Xlsx<FileReader>),
    /// Excel Binary format reader (.xlsb)
    Xlsb(Xlsb<FileReader>),
    /// Legacy Excel format reader (.xls, .xla)
    Xls(Xls<FileReader>),
    /// OpenDocument format reader (.ods)
    Ods(Ods<FileReader>),
}

impl Spreadsheet {
    /// Opens a workbook, picking the reader from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not a spreadsheet one or the
    /// file cannot be opened or parsed by the matching reader.
    pub fn open<P>(path: P) -> Result<Spreadsheet, SpreadsheetError>
    where
        P: AsRef<Path>,
    {
        let extension = path
            .as_ref()
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") | Some("xlam") => Ok(Self::Xlsx(open_workbook(path)?)),
            Some("xlsb") => Ok(Self::Xlsb(open_workbook(path)?)),
            Some("xls") | Some("xla") => Ok(Self::Xls(open_workbook(path)?)),
            Some("ods") => Ok(Self::Ods(open_workbook(path)?)),
            _ => Err(SpreadsheetError::InvalidFileFormat {
                name: path.as_ref().to_string_lossy().to_string(),
            }),
        }
    }

    /// Names of all sheets in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(xlsx) => xlsx.sheet_names(),
            Self::Xlsb(xlsb) => xlsb.sheet_names(),
            Self::Xls(xls) => xls.sheet_names(),
            Self::Ods(ods) => ods.sheet_names(),
        }
    }

    /// Resolves a selector to an existing sheet name.
    pub fn sheet_name(&self, selector: &SheetSelector) -> Result<String, SpreadsheetError> {
        let names = self.sheet_names();
        let found = match selector {
            SheetSelector::Index(index) => names.get(*index).cloned(),
            SheetSelector::Name(name) => names.into_iter().find(|candidate| candidate == name),
        };
        found.ok_or(SpreadsheetError::SheetNotFound {
            sheet: selector.to_string(),
        })
    }

    /// Opens a sheet together with the positions of its formula cells.
    pub fn open_sheet(&mut self, selector: &SheetSelector, with_header: bool) -> Result<Sheet, SpreadsheetError> {
        let name = self.sheet_name(selector)?;
        let values = self.values(&name)?;
        let formulas = self.formulas(&name);
        Sheet::from_range(&name, with_header, &values, formulas.as_ref())
    }

    fn values(&mut self, name: &str) -> Result<calamine::Range<Data>, SpreadsheetError> {
        Ok(match self {
            Self::Xlsx(xlsx) => xlsx.worksheet_range(name)?,
            Self::Xlsb(xlsb) => xlsb.worksheet_range(name)?,
            Self::Xls(xls) => xls.worksheet_range(name)?,
            Self::Ods(ods) => ods.worksheet_range(name)?,
        })
    }

    /// Formula texts of a sheet; unreadable formulas only cost the Formula tag.
    fn formulas(&mut self, name: &str) -> Option<calamine::Range<String>> {
        let formulas = match self {
            Self::Xlsx(xlsx) => xlsx.worksheet_formula(name).map_err(SpreadsheetError::from),
            Self::Xlsb(xlsb) => xlsb.worksheet_formula(name).map_err(SpreadsheetError::from),
            Self::Xls(xls) => xls.worksheet_formula(name).map_err(SpreadsheetError::from),
            Self::Ods(ods) => ods.worksheet_formula(name).map_err(SpreadsheetError::from),
        };
        match formulas {
            Ok(formulas) => Some(formulas),
            Err(error) => {
                debug!(sheet = name, %error, "formulas unavailable");
                None
            }
        }
    }
}

/// Reads one worksheet of a workbook into a table.
///
/// The range option narrows the sheet before the header row is taken,
/// and the date columns are parsed once the table is built.
pub fn read_table<P>(path: P, options: &ReadOptions) -> Result<Table>
where
    P: AsRef<Path>,
{
    let mut spreadsheet = Spreadsheet::open(&path)?;
    let mut sheet = spreadsheet.open_sheet(&options.sheet, options.header)?;
    if let Some(range) = &options.range {
        sheet.restrict(range);
    }
    let table = sheet.to_table(options)?;
    debug!(
        path = %path.as_ref().display(),
        sheet = %sheet.name,
        area = %sheet.area(),
        rows = table.row_count(),
        columns = table.column_count(),
        "read worksheet"
    );
    Ok(table.with_parsed_dates(&options.date_columns))
}
