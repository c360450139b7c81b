//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use sheet_parquet::convert::DEFAULT_PATTERN;
use sheet_parquet::spreadsheet::{Range, SheetSelector};
use sheet_parquet::writer::Codec;

#[derive(Parser)]
#[command(
    name = "sheet-parquet",
    version,
    about = "Inspect spreadsheets and convert them to Parquet",
    long_about = "Inspect spreadsheets and convert them to Parquet.\n\n\
                  Reads .xlsx, .xlsm, .xlsb, .xls and .ods workbooks, drops or renames\n\
                  columns without a header and stores mixed columns as text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "compact", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show declared and runtime types of the first rows of a sheet.
    Inspect(InspectArgs),

    /// Convert one workbook to Parquet.
    Convert(ConvertArgs),

    /// Convert every matching workbook of a directory.
    Batch(BatchArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Workbook to inspect.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Sheet position (0-based) or name.
    #[arg(long, default_value = "0")]
    pub sheet: SheetSelector,

    /// Number of data rows to sample.
    #[arg(long, default_value_t = 3)]
    pub rows: usize,
}

/// Options shared by single and batch conversion.
#[derive(Args)]
pub struct WriteArgs {
    /// Parquet compression codec.
    #[arg(long, default_value = "snappy")]
    pub codec: Codec,

    /// Write the sheet as read, without dropping or renaming columns.
    #[arg(long = "no-clean")]
    pub no_clean: bool,

    /// Read the written file back and compare its shape.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Workbook to convert.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output file (default: FILE with a .parquet extension).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Sheet position (0-based) or name.
    #[arg(long, default_value = "0")]
    pub sheet: SheetSelector,

    /// Text column to parse as dates (repeatable).
    #[arg(long = "date-column", value_name = "NAME")]
    pub date_columns: Vec<String>,

    /// Cell range to read, e.g. A1:D100 or B:F.
    #[arg(long)]
    pub range: Option<Range>,

    /// Treat the first row as data and name columns column1, column2, ...
    #[arg(long = "no-header")]
    pub no_header: bool,

    /// Read error cells such as #DIV/0! as missing values.
    #[arg(long = "error-as-null")]
    pub error_as_null: bool,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Directory holding the workbooks.
    #[arg(value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output directory (default: DIR).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Glob selecting the workbooks inside DIR.
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
