//! # sheet_parquet
//!
//! Inspect spreadsheet files and convert them to Parquet.
//!
//! ## Features
//!
//! - **Multi-format support**: Excel (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.xla`, `.xlam`)
//!   and OpenDocument (`.ods`) workbooks
//! - **Column normalization**: columns without a header are dropped when (nearly) empty
//!   and renamed `Column_<k>` otherwise; mixed columns are stored as text
//! - **Type inspection**: declared cell types next to the types values are read as
//! - **Parquet output**: written through DuckDB with a choice of compression codecs,
//!   optionally read back to verify the row and column counts
//! - **Batch mode**: convert every matching workbook of a directory
//!
//! ## Example
//!
//! ```no_run
//! use sheet_parquet::convert::{convert, ConvertOptions};
//! use sheet_parquet::writer::Codec;
//!
//! let options = ConvertOptions::default().with_codec(Codec::Zstd);
//! if let Some(report) = convert("sales.xlsx", &options) {
//!     println!("{} rows written to {}", report.shape.0, report.output.display());
//! }
//! ```
pub mod convert;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod normalize;
pub mod spreadsheet;
pub mod table;
pub mod writer;

pub use error::{Result, SheetParquetError};
