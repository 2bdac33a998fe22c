//! Kontobuch Core - MT940 statement import and ledger reconciliation
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, etc.)
//! - **statement**: MT940 tokenizer and parser
//! - **ports**: Trait definitions for external dependencies (LedgerRepository, AccountNamer)
//! - **services**: Business logic orchestration (reconciliation, import, history)
//! - **adapters**: Concrete implementations (DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;
pub mod statement;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Account, AccountHistorySnapshot, CashPoint, Transaction, TransactionView};
pub use ports::{AccountNamer, HeadlessNamer, LedgerRepository};
pub use services::{ImportError, ImportSummary};
pub use statement::{parse_statement, ParsedTransaction};

/// File name of the ledger database inside the data directory
pub const DATABASE_FILE: &str = "kontobuch.duckdb";

/// Main context for Kontobuch operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct KontobuchContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub import_service: ImportService,
    pub history_service: HistoryService,
    pub status_service: StatusService,
}

impl KontobuchContext {
    /// Create a new Kontobuch context
    ///
    /// Imports record their events through `logger` when one is given.
    pub fn new(kontobuch_dir: &Path, logger: Option<Arc<LoggingService>>) -> Result<Self> {
        std::fs::create_dir_all(kontobuch_dir).with_context(|| {
            format!("Failed to create data directory {}", kontobuch_dir.display())
        })?;
        let config = Config::load(kontobuch_dir)?;

        let db_path = kontobuch_dir.join(DATABASE_FILE);
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        let mut import_service = ImportService::new(Arc::clone(&repository));
        if let Some(logger) = logger {
            import_service = import_service.with_logger(logger);
        }
        let history_service = HistoryService::new(Arc::clone(&repository));
        let status_service = StatusService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            repository,
            import_service,
            history_service,
            status_service,
        })
    }

    /// Import options from the loaded settings
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::from(&self.config.import)
    }
}
