//! CLI command implementations

pub mod balance;
pub mod history;
pub mod import;
pub mod logs;
pub mod status;
pub mod transactions;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use kontobuch_core::services::{EntryPoint, LogEvent, LoggingService};
use kontobuch_core::KontobuchContext;

/// Environment variable overriding the data directory
const DIR_ENV: &str = "KONTOBUCH_DIR";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let kontobuch_dir = get_kontobuch_dir().ok()?;
    std::fs::create_dir_all(&kontobuch_dir).ok()?;
    LoggingService::new(&kontobuch_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from environment or default
pub fn get_kontobuch_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".kontobuch"))
        .ok_or_else(|| anyhow!("Could not find home directory; set {}", DIR_ENV))
}

/// Open the ledger, recording `command` in the event log
pub fn get_context(command: &str) -> Result<KontobuchContext> {
    let kontobuch_dir = get_kontobuch_dir()?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command(command));

    KontobuchContext::new(&kontobuch_dir, logger)
        .with_context(|| format!("Failed to open ledger in {}", kontobuch_dir.display()))
}
