//! # Columnar Writer
//!
//! Persists a [`Table`] as a Parquet file. The table is staged in an
//! in-memory DuckDB database through an appender and exported with
//! `COPY ... (FORMAT PARQUET)`.
use crate::error::Result;
use crate::table::ColumnType;
use crate::table::Table;
use crate::table::Value;
use chrono::DateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use duckdb::appender_params_from_iter;
use duckdb::types::TimeUnit;
use duckdb::types::Value as DuckValue;
use duckdb::Connection;
use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

/// Name of the staging table inside the in-memory database.
const STAGING_TABLE: &str = "sheet";

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Table has no columns to write")]
    NoColumns,

    #[error("Unknown compression codec '{0}'")]
    UnknownCodec(String),
}

/// Parquet compression codecs; all of them are lossless.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Codec {
    Uncompressed,
    #[default]
    Snappy,
    Gzip,
    Zstd,
    Brotli,
    Lz4,
}

impl Codec {
    /// Returns the DuckDB name of the codec.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Codec::Uncompressed => "uncompressed",
            Codec::Snappy => "snappy",
            Codec::Gzip => "gzip",
            Codec::Zstd => "zstd",
            Codec::Brotli => "brotli",
            Codec::Lz4 => "lz4",
        }
    }
}

impl FromStr for Codec {
    type Err = WriterError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Codec::Uncompressed),
            "snappy" => Ok(Codec::Snappy),
            "gzip" => Ok(Codec::Gzip),
            "zstd" => Ok(Codec::Zstd),
            "brotli" => Ok(Codec::Brotli),
            "lz4" => Ok(Codec::Lz4),
            _ => Err(WriterError::UnknownCodec(name.to_owned())),
        }
    }
}

impl Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persists tables in a columnar file format and reads their shape back.
pub trait ColumnarWriter {
    /// Writes the table to `destination`, returning the size of the file in bytes.
    fn write(&self, table: &Table, destination: &Path, codec: Codec) -> Result<u64>;

    /// Row and column counts of a written file.
    fn read_back(&self, destination: &Path) -> Result<(usize, usize)>;
}

/// Parquet writer backed by an in-memory DuckDB database.
#[derive(Copy, Clone, Debug, Default)]
pub struct DuckDbWriter;

impl ColumnarWriter for DuckDbWriter {
    fn write(&self, table: &Table, destination: &Path, codec: Codec) -> Result<u64> {
        if table.column_count() == 0 {
            Err(WriterError::NoColumns)?
        }
        let schema: Vec<(String, ColumnType)> = column_names(table)
            .into_iter()
            .zip(table.columns().iter().map(|column| column.kind()))
            .collect();
        let definitions = schema
            .iter()
            .map(|(name, kind)| format!("{} {}", quote_identifier(name), kind))
            .collect::<Vec<_>>()
            .join(", ");

        let connection = Connection::open_in_memory()?;
        connection.execute_batch(&format!("CREATE TABLE {STAGING_TABLE} ({definitions})"))?;
        {
            let mut appender = connection.appender(STAGING_TABLE)?;
            for index in 0..table.row_count() {
                let row = table
                    .columns()
                    .iter()
                    .zip(&schema)
                    .map(|(column, (_, kind))| to_duckdb_value(&column.values()[index], *kind));
                appender.append_row(appender_params_from_iter(row))?;
            }
            appender.flush()?;
        }
        connection.execute_batch(&format!(
            "COPY {STAGING_TABLE} TO {} (FORMAT PARQUET, COMPRESSION {})",
            quote_literal(&destination.to_string_lossy()),
            codec.as_str()
        ))?;
        connection.close().map_err(|(_, e)| e)?;

        let bytes = std::fs::metadata(destination)?.len();
        debug!(
            destination = %destination.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            %codec,
            bytes,
            "wrote parquet file"
        );
        Ok(bytes)
    }

    fn read_back(&self, destination: &Path) -> Result<(usize, usize)> {
        let connection = Connection::open_in_memory()?;
        let source = format!("read_parquet({})", quote_literal(&destination.to_string_lossy()));
        let rows: i64 = connection.query_row(&format!("SELECT COUNT(*) FROM {source}"), [], |row| row.get(0))?;
        let columns: i64 = connection.query_row(
            &format!("SELECT COUNT(*) FROM (DESCRIBE SELECT * FROM {source})"),
            [],
            |row| row.get(0),
        )?;
        connection.close().map_err(|(_, e)| e)?;
        Ok((rows as usize, columns as usize))
    }
}

/// Column names as stored in the file.
///
/// DuckDB rejects empty identifiers and compares identifiers without case,
/// so blank labels become `Unnamed: <index>` and labels equal up to case
/// get a numeric suffix. Normalized tables never need either.
fn column_names(table: &Table) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    table
        .labels()
        .into_iter()
        .enumerate()
        .map(|(index, label)| {
            let base = if label.is_empty() {
                format!("Unnamed: {index}")
            } else {
                label.to_owned()
            };
            let name = (0..)
                .map(|suffix| if suffix == 0 { base.clone() } else { format!("{base}.{suffix}") })
                .find(|candidate| !seen.contains(&candidate.to_lowercase()))
                .unwrap_or_default();
            if name != label {
                warn!(label, stored = %name, "column stored under a different name");
            }
            seen.insert(name.to_lowercase());
            name
        })
        .collect()
}

fn to_duckdb_value(value: &Value, kind: ColumnType) -> DuckValue {
    match (kind, value) {
        (_, Value::Null) => DuckValue::Null,
        (ColumnType::Varchar, value) => value.to_text().map(DuckValue::Text).unwrap_or(DuckValue::Null),
        (_, Value::Bool(value)) => DuckValue::Boolean(*value),
        (ColumnType::Double, Value::Int(value)) => DuckValue::Double(*value as f64),
        (_, Value::Int(value)) => DuckValue::BigInt(*value),
        (_, Value::Float(value)) => DuckValue::Double(*value),
        (_, Value::Text(value)) => DuckValue::Text(value.to_owned()),
        (ColumnType::Timestamp, Value::Date(date)) => {
            timestamp(&date.and_time(NaiveTime::MIN).and_utc())
        }
        (_, Value::Date(date)) => {
            DuckValue::Date32((*date - DateTime::UNIX_EPOCH.date_naive()).num_days() as i32)
        }
        (_, Value::DateTime(datetime)) => timestamp(&datetime.and_utc()),
        (_, Value::Time(time)) => {
            let micros = time.num_seconds_from_midnight() as i64 * 1_000_000 + (time.nanosecond() / 1_000) as i64;
            DuckValue::Time64(TimeUnit::Microsecond, micros)
        }
    }
}

fn timestamp(datetime: &DateTime<chrono::Utc>) -> DuckValue {
    DuckValue::Timestamp(TimeUnit::Microsecond, datetime.timestamp_micros())
}

/// Quotes a SQL identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a SQL string literal, doubling embedded quotes.
fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
