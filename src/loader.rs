//! # Batch Loading
//!
//! Each manifest entry walks `Read → Normalize → Reconcile → Build → Execute`.
//! A file either commits wholly through one multi-row INSERT or not at all.
use crate::database::batch::Batch;
use crate::database::reconcile::reconcile_columns;
use crate::database::reconcile::Reconciliation;
use crate::database::session::Session;
use crate::database::table::build_schema_script;
use crate::database::table::TableSchema;
use crate::error::MigrateError;
use crate::error::ResultMessage;
use crate::naming::normalize_column_name;
use crate::source::read_source;
use crate::source::ReadOptions;
use crate::source::SourceRecord;
use crate::source::Tabular;
use crate::spreadsheet::cell::CellValue;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// What a database error does to the rest of the run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first database error.
    #[default]
    Abort,
    /// Record the failure and load the next file.
    Continue,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub read: ReadOptions,
    pub failure_policy: FailurePolicy,
    /// Upper bound on the time spent loading one file
    pub file_deadline: Option<Duration>,
    /// Set to stop the run before the next file starts
    pub cancel: Arc<AtomicBool>,
}

/// Final state of one manifest entry.
#[derive(Clone, Debug, PartialEq)]
pub enum FileStatus {
    Loaded { rows: usize },
    Empty,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileOutcome {
    pub table_name: String,
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Per-file outcomes of a load run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub outcomes: Vec<FileOutcome>,
    /// True when the run stopped early on the cancellation flag
    pub cancelled: bool,
}

impl LoadReport {
    pub fn loaded_rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome.status {
                FileStatus::Loaded { rows } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn loaded_files(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Loaded { .. }))
    }

    pub fn empty_files(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Empty))
    }

    pub fn skipped_files(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Skipped { .. }))
    }

    pub fn failed_files(&self) -> usize {
        self.count(|status| matches!(status, FileStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files() > 0
    }

    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&FileStatus) -> bool,
    {
        self.outcomes.iter().filter(|outcome| predicate(&outcome.status)).count()
    }
}

enum LoadState {
    Read,
    Normalize(Tabular),
    Reconcile {
        header: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    },
    Build {
        reconciliation: Reconciliation,
        rows: Vec<Vec<CellValue>>,
    },
    Execute(Batch),
    Done(FileStatus),
}

/// Loads source files into existing destination tables through one session.
pub struct BatchLoader<'a, S>
where
    S: Session + ?Sized,
{
    session: &'a S,
    options: &'a LoadOptions,
}

impl<'a, S> BatchLoader<'a, S>
where
    S: Session + ?Sized,
{
    pub fn new(session: &'a S, options: &'a LoadOptions) -> Self {
        Self { session, options }
    }

    /// Loads every entry in order and reports one outcome per entry.
    ///
    /// # Errors
    /// The first database error under [`FailurePolicy::Abort`]. Every other
    /// failure is recorded in the report.
    pub fn load_all(&self, sources: &[SourceRecord]) -> Result<LoadReport, MigrateError> {
        let mut report = LoadReport::default();
        for source in sources {
            if self.options.cancel.load(Ordering::Relaxed) {
                log::warn!("Run cancelled, {} file(s) not loaded", sources.len() - report.outcomes.len());
                report.cancelled = true;
                break;
            }

            let status = match self.load_file(source) {
                Ok(FileStatus::Skipped { reason }) => {
                    log::warn!("Skip '{}' for '{}': {}", source.path.display(), source.table_name, reason);
                    FileStatus::Skipped { reason }
                }
                Ok(status) => status,
                Err(MigrateError::MissingSourceFile(path)) => {
                    log::warn!("Skip '{}': file '{}' does not exist", source.table_name, path.display());
                    FileStatus::Skipped {
                        reason: format!("file '{}' does not exist", path.display()),
                    }
                }
                Err(e) if e.is_database_error() && self.options.failure_policy == FailurePolicy::Abort => {
                    log::error!("Failed to load '{}' into '{}': {}", source.path.display(), source.table_name, e);
                    return Err(e).with_prefix(&format!(
                        "Load '{}' into '{}'",
                        source.path.display(),
                        source.table_name
                    ));
                }
                Err(e) => {
                    log::error!("Failed to load '{}' into '{}': {}", source.path.display(), source.table_name, e);
                    FileStatus::Failed { error: e.to_string() }
                }
            };
            report.outcomes.push(FileOutcome {
                table_name: source.table_name.to_owned(),
                path: source.path.to_owned(),
                status,
            });
        }

        log::info!(
            "Loaded {} row(s) from {} file(s); {} empty, {} skipped, {} failed",
            report.loaded_rows(),
            report.loaded_files(),
            report.empty_files(),
            report.skipped_files(),
            report.failed_files()
        );
        Ok(report)
    }

    /// Runs one entry through the load states.
    pub fn load_file(&self, source: &SourceRecord) -> Result<FileStatus, MigrateError> {
        let started = Instant::now();
        let mut state = LoadState::Read;
        loop {
            if let LoadState::Done(status) = state {
                return Ok(status);
            }
            self.check_deadline(source, started)?;
            state = self.step(source, state)?;
        }
    }

    fn step(&self, source: &SourceRecord, state: LoadState) -> Result<LoadState, MigrateError> {
        let table = source.table_name.as_str();
        Ok(match state {
            LoadState::Read => {
                log::debug!("Reading '{}' for '{}'", source.path.display(), table);
                LoadState::Normalize(read_source(source, &self.options.read)?)
            }
            LoadState::Normalize(tabular) => LoadState::Reconcile {
                header: tabular.header.iter().map(String::as_str).map(normalize_column_name).collect(),
                rows: tabular.rows,
            },
            LoadState::Reconcile { header, rows } => {
                let reconciliation = reconcile_columns(self.session, table, &header)?;
                if rows.is_empty() {
                    log::warn!("'{}' has no data rows, nothing loaded into '{}'", source.path.display(), table);
                    LoadState::Done(FileStatus::Empty)
                } else if reconciliation.is_empty() {
                    LoadState::Done(FileStatus::Skipped {
                        reason: format!("no source column exists in '{}'", table),
                    })
                } else {
                    LoadState::Build { reconciliation, rows }
                }
            }
            LoadState::Build { reconciliation, rows } => {
                LoadState::Execute(Batch::project(table, reconciliation.columns, &reconciliation.indexes, rows))
            }
            LoadState::Execute(batch) => {
                let rows = self.session.insert(&batch)?;
                log::info!("Loaded {} row(s) from '{}' into '{}'", rows, source.path.display(), table);
                LoadState::Done(FileStatus::Loaded { rows })
            }
            LoadState::Done(status) => LoadState::Done(status),
        })
    }

    fn check_deadline(&self, source: &SourceRecord, started: Instant) -> Result<(), MigrateError> {
        match self.options.file_deadline {
            Some(deadline) if started.elapsed() > deadline => Err(MigrateError::DeadlineExceeded {
                table: source.table_name.to_owned(),
                seconds: deadline.as_secs(),
            }),
            _ => Ok(()),
        }
    }
}

/// Creates the declared tables, then loads every source into them.
///
/// Table names are validated before any DDL runs, so a collision leaves the
/// destination untouched.
pub fn migrate<S>(
    session: &S,
    schemas: &[TableSchema],
    sources: &[SourceRecord],
    options: &LoadOptions,
) -> Result<LoadReport, MigrateError>
where
    S: Session + ?Sized,
{
    let script = build_schema_script(schemas)?;
    if !script.is_empty() {
        session.execute_script(&script).with_prefix("Create tables")?;
        log::info!("Created {} table(s)", schemas.len());
    }
    BatchLoader::new(session, options).load_all(sources)
}
