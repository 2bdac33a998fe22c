//! Import service - MT940 statement import

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::config::ImportSettings;
use crate::domain::result::Error;
use crate::domain::{NewSnapshot, DEFAULT_CATEGORY};
use crate::ports::{AccountNamer, HeadlessNamer, HistoryOutcome, LedgerRepository, UpdateOutcome};
use crate::services::logging::{LogEvent, LoggingService};
use crate::services::reconcile::{ImportError, ImportSummary, ReconciliationEngine};
use crate::statement::{parse_statement, ParsedTransaction};

/// Options for one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Commit the whole file as one transaction
    pub atomic: bool,
    /// Category given to the imported transactions
    pub category: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl From<&ImportSettings> for ImportOptions {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            atomic: settings.atomic,
            category: settings.default_category.clone(),
        }
    }
}

/// Parse statement text and reconcile it into `repository`
///
/// With `options.atomic` the run is wrapped in one transaction; a failure
/// rolls everything back and the returned summary reports nothing written.
/// Otherwise every statement commits on its own and a failure reports what
/// was already persisted.
pub fn import_statement<R, N>(
    repository: &R,
    text: &str,
    namer: &N,
    options: &ImportOptions,
) -> std::result::Result<ImportSummary, ImportError>
where
    R: LedgerRepository,
    N: AccountNamer + ?Sized,
{
    let parsed = parse_statement(text).map_err(|e| ImportError {
        summary: ImportSummary::default(),
        source: e.into(),
    })?;

    let engine = ReconciliationEngine::new(repository, namer).with_category(options.category.as_str());

    if !options.atomic {
        return engine.reconcile(&parsed);
    }

    repository.begin().map_err(|source| ImportError {
        summary: ImportSummary::default(),
        source,
    })?;

    match engine.reconcile(&parsed) {
        Ok(summary) => match repository.commit() {
            Ok(()) => Ok(summary),
            Err(source) => {
                rollback(repository);
                Err(ImportError {
                    summary: summary.discarded(),
                    source,
                })
            }
        },
        Err(err) => {
            rollback(repository);
            Err(ImportError {
                summary: err.summary.discarded(),
                source: err.source,
            })
        }
    }
}

fn rollback<R: LedgerRepository>(repository: &R) {
    if let Err(e) = repository.rollback() {
        warn!("Rollback failed: {}", e);
    }
}

/// Store a manual snapshot and move the account balance in one transaction
fn record_manual_balance<R: LedgerRepository>(
    repository: &R,
    account_id: Uuid,
    balance: Decimal,
    date: NaiveDate,
    manual_override: bool,
    today: NaiveDate,
) -> crate::domain::result::Result<(HistoryOutcome, Option<UpdateOutcome>)> {
    let engine = ReconciliationEngine::new(repository, &HeadlessNamer).with_today(today);
    let mut summary = ImportSummary::default();

    repository.begin()?;
    let outcome = (|| -> crate::domain::result::Result<_> {
        let snapshot = NewSnapshot {
            account_id,
            balance,
            record_date: date,
            change_date: today,
            manual: true,
        };
        let recorded = engine.record_snapshot(&snapshot, manual_override, &mut summary)?;
        let update = match recorded {
            HistoryOutcome::AlreadyExists => None,
            HistoryOutcome::Inserted | HistoryOutcome::Replaced => {
                Some(engine.update_balance(account_id, balance, date, &mut summary)?)
            }
        };
        Ok((recorded, update))
    })();

    match outcome.and_then(|values| repository.commit().map(|()| values)) {
        Ok(values) => Ok(values),
        Err(e) => {
            rollback(repository);
            Err(e)
        }
    }
}

/// Result of a manual balance entry
#[derive(Debug, Clone, Serialize)]
pub struct ManualBalanceResult {
    pub account_number: String,
    pub date: NaiveDate,
    pub balance: Decimal,
    /// False if a snapshot for that day existed and was kept
    pub recorded: bool,
    pub replaced: bool,
    pub account_updated: bool,
    /// The account holds a newer balance, so only the snapshot was stored
    pub stale: bool,
}

/// Import service for statement files
pub struct ImportService {
    repository: Arc<DuckDbRepository>,
    logger: Option<Arc<LoggingService>>,
}

impl ImportService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self {
            repository,
            logger: None,
        }
    }

    /// Record import events in the event log
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Parse a statement file without touching the ledger
    pub fn preview(&self, file_path: &Path) -> Result<Vec<ParsedTransaction>> {
        let text = read_statement(file_path)?;
        let parsed = parse_statement(&text)
            .with_context(|| format!("Failed to parse {}", file_path.display()))?;
        Ok(parsed)
    }

    /// Import a statement file
    pub fn import_file<N: AccountNamer + ?Sized>(
        &self,
        file_path: &Path,
        namer: &N,
        options: &ImportOptions,
    ) -> std::result::Result<ImportSummary, ImportError> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.log(LogEvent::new("import_started").with_file_name(&file_name));
        info!(file = %file_path.display(), atomic = options.atomic, "Importing statement");

        let result = std::fs::read_to_string(file_path)
            .map_err(|e| ImportError {
                summary: ImportSummary::default(),
                source: Error::Io(e),
            })
            .and_then(|text| import_statement(self.repository.as_ref(), &text, namer, options));

        match &result {
            Ok(summary) => {
                self.log(LogEvent::new("import_completed").with_file_name(&file_name));
                info!(rows = summary.rows_written(), "Import completed");
            }
            Err(err) => {
                self.log(
                    LogEvent::new("import_failed")
                        .with_file_name(&file_name)
                        .with_error(error_kind(&err.source)),
                );
                warn!("Import failed: {}", err);
            }
        }

        result
    }

    /// Store a hand-entered balance and move the account to it if it is
    /// the newest one
    ///
    /// An existing snapshot for the same day is kept unless
    /// `manual_override` is set.
    pub fn add_manual_balance(
        &self,
        account_number: &str,
        balance: Decimal,
        date: NaiveDate,
        manual_override: bool,
    ) -> Result<ManualBalanceResult> {
        let account = self
            .repository
            .get_account_by_number(account_number)?
            .ok_or_else(|| Error::not_found(format!("account {}", account_number.trim())))?;

        let (recorded, update) = record_manual_balance(
            self.repository.as_ref(),
            account.id,
            balance,
            date,
            manual_override,
            Utc::now().date_naive(),
        )?;

        self.log(LogEvent::new("balance_added"));

        Ok(ManualBalanceResult {
            account_number: account.number,
            date,
            balance,
            recorded: recorded != HistoryOutcome::AlreadyExists,
            replaced: recorded == HistoryOutcome::Replaced,
            account_updated: update == Some(UpdateOutcome::Updated),
            stale: update == Some(UpdateOutcome::Stale),
        })
    }

    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            if let Err(e) = logger.log(event) {
                warn!("Failed to write event log: {}", e);
            }
        }
    }
}

fn read_statement(file_path: &Path) -> Result<String> {
    std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))
}

/// Error category for the event log, which must not carry statement data
fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::Database(_) => "database",
        Error::NotFound(_) => "not_found",
        Error::Parse(_) => "parse",
        Error::Io(_) => "io",
    }
}
