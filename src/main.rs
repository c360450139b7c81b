//! Spreadsheet to Parquet command line.

use anyhow::{bail, Context, Result};
use clap::Parser;
use sheet_parquet::convert::{batch_convert, convert, BatchOptions, ConvertOptions};
use sheet_parquet::inspect::{inspect, InspectOptions};
use sheet_parquet::logging::{init_logging, LogConfig, LogFormat};
use sheet_parquet::spreadsheet::ReadOptions;
use std::io::{self, IsTerminal};

mod cli;

use crate::cli::{BatchArgs, Cli, Command, ConvertArgs, InspectArgs, LogFormatArg, WriteArgs};

fn main() {
    let cli = Cli::parse();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let result = match cli.command {
        Command::Inspect(args) => run_inspect(&args),
        Command::Convert(args) => run_convert(&args),
        Command::Batch(args) => run_batch(&args),
    };
    if let Err(error) = result {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig {
        use_env_filter: !cli.verbosity.is_present(),
        ..LogConfig::default()
    }
    .with_level_filter(cli.verbosity.tracing_level_filter())
    .with_format(format)
    .with_log_file(cli.log_file.clone())
    .with_ansi(cli.log_file.is_none() && io::stderr().is_terminal())
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let options = InspectOptions::default()
        .with_sheet(args.sheet.clone())
        .with_sample_rows(args.rows);
    let report = inspect(&args.file, &options).context("inspection failed")?;
    println!("{report}");
    Ok(())
}

fn convert_options(write: &WriteArgs) -> ConvertOptions {
    ConvertOptions::default()
        .with_codec(write.codec)
        .with_clean(!write.no_clean)
        .with_verify(write.verify)
}

fn run_convert(args: &ConvertArgs) -> Result<()> {
    let mut read = ReadOptions::default()
        .with_sheet(args.sheet.clone())
        .with_header(!args.no_header)
        .with_error_as_null(args.error_as_null)
        .with_date_columns(args.date_columns.iter().cloned());
    if let Some(range) = args.range {
        read = read.with_range(range);
    }
    let mut options = convert_options(&args.write).with_read(read);
    if let Some(output) = &args.output {
        options = options.with_output(output);
    }
    match convert(&args.file, &options) {
        Some(report) => {
            println!(
                "{} -> {} ({} rows, {} columns, {:.1}% smaller)",
                report.input.display(),
                report.output.display(),
                report.shape.0,
                report.shape.1,
                report.space_saved_percent()
            );
            Ok(())
        }
        None => bail!("conversion of {} failed", args.file.display()),
    }
}

fn run_batch(args: &BatchArgs) -> Result<()> {
    let mut options = BatchOptions::default()
        .with_pattern(&args.pattern)
        .with_convert(convert_options(&args.write));
    if let Some(output_dir) = &args.output_dir {
        options = options.with_output_dir(output_dir);
    }
    let report = batch_convert(&args.input_dir, &options)
        .with_context(|| format!("cannot convert workbooks in {}", args.input_dir.display()))?;
    println!(
        "Batch conversion complete: {}/{} files converted",
        report.converted.len(),
        report.found.len()
    );
    if !report.is_complete() {
        for path in report.failed() {
            eprintln!("failed: {}", path.display());
        }
        bail!("{} file(s) failed", report.failed().len());
    }
    Ok(())
}
