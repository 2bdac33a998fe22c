//! Event log migrations - embedded SQL files
//!
//! Applied to logs.duckdb by the same migration runner as the ledger
//! database, tracked in that database's own sys_migrations table.

/// All log migrations, embedded at compile time.
/// Format: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
