//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod history;
pub mod import;
pub mod logging;
pub mod migration;
pub mod reconcile;
mod status;

pub use history::{total_cash_timeline, DateFilter, HistoryService};
pub use import::{import_statement, ImportOptions, ImportService, ManualBalanceResult};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use reconcile::{ImportError, ImportSummary, ReconciliationEngine};
pub use status::{AccountSummary, DateRange, StatusService, StatusSummary};
