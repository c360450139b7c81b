//! # Conversion Driver
//!
//! Runs a workbook through the reader, the normalizer and the columnar
//! writer. Failures are logged and reported as `None` instead of being
//! returned, so a batch keeps going after a bad file.
use crate::error::Result;
use crate::error::ResultMessage;
use crate::error::SheetParquetError;
use crate::normalize::normalize_with;
use crate::normalize::NormalizeOptions;
use crate::spreadsheet::read_table;
use crate::spreadsheet::ReadOptions;
use crate::table::Table;
use crate::writer::Codec;
use crate::writer::ColumnarWriter;
use crate::writer::DuckDbWriter;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::warn;

/// Default glob selecting the workbooks of a directory.
pub const DEFAULT_PATTERN: &str = "*.xls*";

const KIB: f64 = 1024.0;

/// Why a single conversion produced no output.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Cannot read '{}'", path.display())]
    SourceUnreadable {
        path: PathBuf,
        source: SheetParquetError,
    },

    #[error("Cannot write '{}'", path.display())]
    WriteFailure {
        path: PathBuf,
        source: SheetParquetError,
    },

    #[error(
        "Verification of '{}' failed: expected {} rows x {} columns, found {} rows x {} columns",
        path.display(), expected.0, expected.1, actual.0, actual.1
    )]
    VerificationMismatch {
        path: PathBuf,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Options of a single conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertOptions {
    /// Destination file; the input path with a `.parquet` extension when unset
    pub output: Option<PathBuf>,
    /// How the worksheet is read
    pub read: ReadOptions,
    /// Parquet compression codec
    pub codec: Codec,
    /// Whether the normalizer runs before writing
    pub clean: bool,
    /// Whether the written file is read back and compared
    pub verify: bool,
    /// Normalizer thresholds and sentinels
    pub normalize: NormalizeOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output: None,
            read: ReadOptions::default(),
            codec: Codec::default(),
            clean: true,
            verify: false,
            normalize: NormalizeOptions::default(),
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    #[must_use]
    pub fn with_read(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn with_normalize(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    /// Destination of a conversion of `input`.
    pub fn output_for(&self, input: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| input.with_extension("parquet"))
    }
}

/// Outcome of a successful conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Rows and columns as read from the workbook
    pub source_shape: (usize, usize),
    /// Rows and columns written
    pub shape: (usize, usize),
    pub codec: Codec,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Rows and columns found when reading the file back, if verified
    pub verified: Option<(usize, usize)>,
}

impl ConversionReport {
    /// How much smaller the output is than the input, in percent.
    pub fn space_saved_percent(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            (1.0 - self.output_bytes as f64 / self.input_bytes as f64) * 100.0
        }
    }
}

/// Converts one workbook to Parquet.
///
/// Returns `None` after logging the cause when the workbook cannot be read,
/// the file cannot be written or verification fails.
pub fn convert<P: AsRef<Path>>(input: P, options: &ConvertOptions) -> Option<ConversionReport> {
    convert_with(&DuckDbWriter, input.as_ref(), options)
}

/// Converts one workbook with verification forced on.
pub fn convert_advanced<P: AsRef<Path>>(input: P, options: &ConvertOptions) -> Option<ConversionReport> {
    let options = options.clone().with_verify(true);
    convert_with(&DuckDbWriter, input.as_ref(), &options)
}

/// Converts one workbook through the given writer.
pub fn convert_with<W: ColumnarWriter>(
    writer: &W,
    input: &Path,
    options: &ConvertOptions,
) -> Option<ConversionReport> {
    let _span = info_span!("convert", input = %input.display()).entered();
    let previous = modified_at(&options.output_for(input));
    match try_convert(writer, input, options) {
        Ok(report) => Some(report),
        Err(failure) => {
            error!(error = %error_chain(&failure), "conversion failed");
            discard_output(&failure, previous);
            None
        }
    }
}

fn try_convert<W: ColumnarWriter>(
    writer: &W,
    input: &Path,
    options: &ConvertOptions,
) -> std::result::Result<ConversionReport, ConversionError> {
    let output = options.output_for(input);
    info!(
        input = %input.display(),
        output = %output.display(),
        codec = %options.codec,
        clean = options.clean,
        verify = options.verify,
        "converting workbook to parquet"
    );

    let unreadable = |source| ConversionError::SourceUnreadable {
        path: input.to_path_buf(),
        source,
    };
    let input_bytes = std::fs::metadata(input).map_err(|e| unreadable(e.into()))?.len();
    let table = read_table(input, &options.read).map_err(unreadable)?;
    let source_shape = (table.row_count(), table.column_count());
    info!(rows = source_shape.0, columns = source_shape.1, "read workbook");
    log_schema(&table, "source column");

    let table = if options.clean {
        let cleaned = normalize_with(&table, &options.normalize);
        info!(
            columns = cleaned.column_count(),
            dropped = table.column_count() - cleaned.column_count(),
            "cleaned table"
        );
        log_schema(&cleaned, "final column");
        cleaned
    } else {
        table
    };
    let shape = (table.row_count(), table.column_count());

    let output_bytes = writer
        .write(&table, &output, options.codec)
        .map_err(|source| ConversionError::WriteFailure {
            path: output.clone(),
            source,
        })?;
    info!(output = %output.display(), "created parquet file");

    let verified = if options.verify {
        let actual = writer
            .read_back(&output)
            .map_err(|source| ConversionError::WriteFailure {
                path: output.clone(),
                source,
            })?;
        if actual != shape {
            Err(ConversionError::VerificationMismatch {
                path: output.clone(),
                expected: shape,
                actual,
            })?
        }
        info!(rows = actual.0, columns = actual.1, "verified parquet file");
        Some(actual)
    } else {
        None
    };

    let report = ConversionReport {
        input: input.to_path_buf(),
        output,
        source_shape,
        shape,
        codec: options.codec,
        input_bytes,
        output_bytes,
        verified,
    };
    info!(
        input_kib = %format!("{:.2}", input_bytes as f64 / KIB),
        output_kib = %format!("{:.2}", output_bytes as f64 / KIB),
        space_saved = %format!("{:.1}%", report.space_saved_percent()),
        "file size comparison"
    );
    Ok(report)
}

fn log_schema(table: &Table, message: &str) {
    for (label, kind) in table.schema() {
        info!(column = label, %kind, "{message}");
    }
}

/// Error message followed by every cause, separated by ": ".
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Modification time of a file, `None` when it does not exist.
fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|metadata| metadata.modified()).ok()
}

/// Removes a file left behind by a failed write or verification.
///
/// A file that is unchanged since before the conversion started belongs to
/// an earlier run and is kept.
fn discard_output(failure: &ConversionError, previous: Option<SystemTime>) {
    let path = match failure {
        ConversionError::SourceUnreadable { .. } => return,
        ConversionError::WriteFailure { path, .. } | ConversionError::VerificationMismatch { path, .. } => path,
    };
    let current = modified_at(path);
    if current.is_some() && current != previous {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "cannot remove incomplete output");
        }
    }
}

/// Options of a directory conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOptions {
    /// Destination directory; the input directory when unset
    pub output_dir: Option<PathBuf>,
    /// Glob matched against file names inside the input directory
    pub pattern: String,
    /// Options applied to every file; their `output` is ignored
    pub convert: ConvertOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            pattern: DEFAULT_PATTERN.to_owned(),
            convert: ConvertOptions::default(),
        }
    }
}

impl BatchOptions {
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn with_convert(mut self, convert: ConvertOptions) -> Self {
        self.convert = convert;
        self
    }
}

/// Outcome of a directory conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Every file matched by the pattern
    pub found: Vec<PathBuf>,
    /// Reports of the files converted successfully
    pub converted: Vec<ConversionReport>,
}

impl BatchReport {
    /// Files matched but not converted.
    pub fn failed(&self) -> Vec<&Path> {
        self.found
            .iter()
            .filter(|path| !self.converted.iter().any(|report| &report.input == *path))
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.converted.len() == self.found.len()
    }
}

/// Converts every matching workbook of a directory, one after another.
///
/// # Errors
///
/// Only setup problems are errors: an invalid pattern or an output
/// directory that cannot be created. Files that fail to convert are logged
/// and left out of [`BatchReport::converted`], as are files whose stem was
/// already converted (`a.xls` after `a.xlsx`).
pub fn batch_convert<P: AsRef<Path>>(input_dir: P, options: &BatchOptions) -> Result<BatchReport> {
    let input_dir = input_dir.as_ref();
    let output_dir = options.output_dir.as_deref().unwrap_or(input_dir);
    std::fs::create_dir_all(output_dir)
        .map_err(SheetParquetError::from)
        .with_prefix(&output_dir.display().to_string())?;

    let pattern = Path::new(&glob::Pattern::escape(&input_dir.to_string_lossy())).join(&options.pattern);
    let mut found = glob::glob(&pattern.to_string_lossy())?
        .collect::<std::result::Result<Vec<PathBuf>, _>>()?
        .into_iter()
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    found.sort();
    info!(count = found.len(), pattern = %options.pattern, "found workbooks to convert");

    let mut converted = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    for input in &found {
        let stem = input.file_stem().map(|stem| stem.to_string_lossy().to_string()).unwrap_or_default();
        let output = output_dir.join(format!("{stem}.parquet"));
        if !claimed.insert(output.clone()) {
            warn!(
                file = %input.display(),
                output = %output.display(),
                "skipping workbook, its output is already written by another file of this batch"
            );
            continue;
        }
        let convert_options = ConvertOptions {
            output: Some(output),
            ..options.convert.clone()
        };
        info!(file = %input.display(), "converting");
        if let Some(report) = convert(input, &convert_options) {
            converted.push(report);
        }
    }

    info!(
        converted = converted.len(),
        found = found.len(),
        "batch conversion complete"
    );
    Ok(BatchReport { found, converted })
}
