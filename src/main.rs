//! CLI entry point for `rusty-migrate`.
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use rusty_migrate::database::table::build_schema_script;
use rusty_migrate::loader::FileStatus;
use rusty_migrate::migrate;
use rusty_migrate::BatchLoader;
use rusty_migrate::DuckDbSession;
use rusty_migrate::FailurePolicy;
use rusty_migrate::LoadOptions;
use rusty_migrate::LoadReport;
use rusty_migrate::Manifest;
use rusty_migrate::ManifestOptions;
use rusty_migrate::Session;
use rusty_migrate::TableNameStyle;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "rusty-migrate",
    version,
    about = "Load the CSV and spreadsheet datasets of a data model into DuckDB tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add the normalized `table_name` column to the data model
    Tables {
        #[command(flatten)]
        manifest: ManifestArgs,
        /// Data model file to write
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Write the DROP/CREATE TABLE script for every dataset
    Schema {
        #[command(flatten)]
        manifest: ManifestArgs,
        /// SQL script to write
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Create the tables and load every dataset into them
    Migrate {
        #[command(flatten)]
        manifest: ManifestArgs,
        /// Directory holding the source files
        #[arg(long, default_value = ".")]
        prefix: PathBuf,
        /// DuckDB database file, or `:memory:`
        #[arg(long)]
        database: String,
        /// Run this DDL script instead of the one built from `FIELDS`
        #[arg(long)]
        schema_script: Option<PathBuf>,
        /// Record database errors and load the remaining files
        #[arg(long)]
        continue_on_error: bool,
        /// Give up on a file after this many seconds
        #[arg(long)]
        file_timeout: Option<u64>,
        /// Delimited-text fields loaded as NULL (default: the empty string)
        #[arg(long = "null")]
        nulls: Vec<String>,
    },
    /// Point every dataset at its destination table
    Convert {
        #[command(flatten)]
        manifest: ManifestArgs,
        /// Value written to the `format` key of `DATASET`
        #[arg(long, default_value = "duckdb")]
        format: String,
        /// Data model file to write
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct ManifestArgs {
    /// Data model file
    #[arg(long, short = 'm')]
    data_model: PathBuf,
    /// Field delimiter of the data model
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Text encoding of the data model
    #[arg(long, default_value = "utf-8")]
    encoding: String,
    /// Treatment of table names starting with a number
    #[arg(long, value_enum, default_value_t = TableStyle::Compatible)]
    table_style: TableStyle,
}

#[derive(Copy, Clone, ValueEnum)]
enum TableStyle {
    /// Keep the leading number in place
    Compatible,
    /// Move the leading number token to the end
    Reorder,
}

impl From<TableStyle> for TableNameStyle {
    fn from(style: TableStyle) -> Self {
        match style {
            TableStyle::Compatible => TableNameStyle::Compatible,
            TableStyle::Reorder => TableNameStyle::ReorderLeadingNumber,
        }
    }
}

impl ManifestArgs {
    fn read(&self) -> Result<Manifest> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter '{}' is not a single-byte character", self.delimiter);
        }
        let options = ManifestOptions {
            delimiter: self.delimiter as u8,
            encoding: self.encoding.to_owned(),
        };
        let manifest = Manifest::read(&self.data_model, &options)?;
        log::info!(
            "Read {} dataset(s) from '{}'",
            manifest.records.len(),
            self.data_model.display()
        );
        Ok(manifest)
    }

    fn style(&self) -> TableNameStyle {
        self.table_style.into()
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

/// Runs one subcommand; `Ok(false)` when some file failed to load.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Tables { manifest, output } => {
            manifest.read()?.with_table_names(manifest.style())?.write(&output)?;
            log::info!("Wrote table names to '{}'", output.display());
        }
        Command::Schema { manifest, output } => {
            let script = build_schema_script(&manifest.read()?.schemas(manifest.style())?)?;
            std::fs::write(&output, script).with_context(|| format!("Write '{}'", output.display()))?;
            log::info!("Wrote schema script to '{}'", output.display());
        }
        Command::Convert {
            manifest,
            format,
            output,
        } => {
            manifest
                .read()?
                .with_table_names(manifest.style())?
                .convert_datasets(&format)?
                .write(&output)?;
            log::info!("Wrote converted data model to '{}'", output.display());
        }
        Command::Migrate {
            manifest,
            prefix,
            database,
            schema_script,
            continue_on_error,
            file_timeout,
            nulls,
        } => {
            let data_model = manifest.read()?;
            let sources = data_model.sources(&prefix, manifest.style())?;

            let mut options = LoadOptions {
                failure_policy: if continue_on_error {
                    FailurePolicy::Continue
                } else {
                    FailurePolicy::Abort
                },
                file_deadline: file_timeout.map(Duration::from_secs),
                ..LoadOptions::default()
            };
            if !nulls.is_empty() {
                options.read.nulls = nulls.into_iter().collect::<HashSet<String>>();
            }

            let session = DuckDbSession::open(&database)?;
            let report = match schema_script {
                Some(path) => {
                    let script = std::fs::read_to_string(&path)
                        .with_context(|| format!("Read '{}'", path.display()))?;
                    session.execute_script(&script)?;
                    BatchLoader::new(&session, &options).load_all(&sources)?
                }
                None => migrate(&session, &data_model.schemas(manifest.style())?, &sources, &options)?,
            };
            session.close()?;
            print_unloaded(&report);
            return Ok(!report.has_failures());
        }
    }
    Ok(true)
}

/// Lists every file that was skipped or failed.
fn print_unloaded(report: &LoadReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            FileStatus::Skipped { reason } => {
                eprintln!("skipped {} <- {}: {}", outcome.table_name, outcome.path.display(), reason)
            }
            FileStatus::Failed { error } => {
                eprintln!("failed  {} <- {}: {}", outcome.table_name, outcome.path.display(), error)
            }
            FileStatus::Loaded { .. } | FileStatus::Empty => {}
        }
    }
}
