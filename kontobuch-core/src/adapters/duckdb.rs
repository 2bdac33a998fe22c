//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountHistorySnapshot, AccountUpdate, NewSnapshot, NewTransaction, ReferenceEntity,
    SqlValue, Transaction, TransactionView,
};
use crate::ports::{HistoryOutcome, InsertOutcome, LedgerRepository, Resolved, UpdateOutcome};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::Database(err.to_string())
    }
}

const ACCOUNT_COLUMNS: &str = "id, number, name, balance::VARCHAR, difference::VARCHAR,
    record_date::VARCHAR, change_date::VARCHAR, created_at::VARCHAR";

const HISTORY_COLUMNS: &str = "id, account_id, balance::VARCHAR, record_date::VARCHAR,
    change_date::VARCHAR, manual";

const TRANSACTION_COLUMNS: &str = "id, account_id, value_date::VARCHAR, booking_date::VARCHAR,
    transaction_type_id, amount::VARCHAR, purpose, purpose_addition, counterparty_id,
    category_id, reference, user_comments, displayed_name, created_at::VARCHAR";

/// DuckDB ledger repository
///
/// Holds a single connection. Every method locks it for the duration of
/// one call, so an import transaction opened with `begin()` spans all calls
/// made until `commit()` or `rollback()`.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database file
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when another process still holds the file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        // Exponential backoff: 50ms, 100ms, 200ms, 400ms
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            "Database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off: cached extensions in ~/.duckdb
        // may not match the bundled engine
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.connection()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let result = self.run_migrations()?;
        if !result.applied.is_empty() {
            debug!(applied = ?result.applied, "Database schema upgraded");
        }
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // === Account operations ===

    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM sys_accounts ORDER BY number"
        ))?;
        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    pub fn get_account_by_number(&self, number: &str) -> Result<Option<Account>> {
        let conn = self.connection()?;
        optional(conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM sys_accounts WHERE number = ? LIMIT 1"),
            params![number.trim()],
            row_to_account,
        ))
    }

    pub fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let conn = self.connection()?;
        optional(conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM sys_accounts WHERE id = ?"),
            params![id.to_string()],
            row_to_account,
        ))
    }

    // === Transaction operations ===

    pub fn get_transactions_by_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM sys_transactions
             WHERE account_id = ? ORDER BY value_date, booking_date, created_at"
        ))?;
        let transactions = stmt
            .query_map(params![account_id.to_string()], row_to_transaction)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(transactions)
    }

    /// Transactions joined with account, type, counterparty and category,
    /// newest first
    pub fn get_transaction_views(
        &self,
        account_number: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TransactionView>> {
        let conn = self.connection()?;

        let mut sql = String::from(
            "SELECT t.id, a.number, t.value_date::VARCHAR, t.booking_date::VARCHAR,
                    t.amount::VARCHAR, t.purpose,
                    COALESCE(tt.name, ''),
                    COALESCE(NULLIF(cp.name, ''), cp.number, ''),
                    COALESCE(c.name, '')
             FROM sys_transactions t
             JOIN sys_accounts a ON a.id = t.account_id
             LEFT JOIN sys_transaction_types tt ON tt.id = t.transaction_type_id
             LEFT JOIN sys_counterparties cp ON cp.id = t.counterparty_id
             LEFT JOIN sys_categories c ON c.id = t.category_id",
        );
        let mut query_params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(number) = account_number {
            sql.push_str(" WHERE a.number = ?");
            query_params.push(Box::new(number.trim().to_string()));
        }
        sql.push_str(" ORDER BY t.value_date DESC, t.booking_date DESC, t.created_at DESC LIMIT ?");
        query_params.push(Box::new(limit as i64));

        let param_refs: Vec<&dyn ToSql> = query_params.iter().map(|b| b.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let views = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok(TransactionView {
                    id: get_uuid(row, 0)?,
                    account_number: row.get(1)?,
                    date: get_date(row, 2)?,
                    booking_date: get_date(row, 3)?,
                    amount: get_decimal(row, 4)?,
                    purpose: row.get(5)?,
                    transaction_type: row.get(6)?,
                    counterparty: row.get(7)?,
                    category: row.get(8)?,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(views)
    }

    pub fn get_transaction_count(&self) -> Result<i64> {
        self.count_rows("sys_transactions")
    }

    /// Earliest and latest value date of all transactions
    pub fn get_transaction_date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let conn = self.connection()?;
        let (earliest, latest): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(value_date)::VARCHAR, MAX(value_date)::VARCHAR FROM sys_transactions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let parse = |s: Option<String>| {
            s.map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| Error::database(format!("Invalid date '{s}': {e}")))
            })
            .transpose()
        };
        Ok((parse(earliest)?, parse(latest)?))
    }

    pub fn get_counterparty_count(&self) -> Result<i64> {
        self.count_rows("sys_counterparties")
    }

    pub fn get_history_count(&self) -> Result<i64> {
        self.count_rows("sys_account_history")
    }

    fn count_rows(&self, table: &str) -> Result<i64> {
        let conn = self.connection()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    // === Account history operations ===

    /// Snapshots of one account, oldest first
    pub fn get_account_history(&self, account_id: Uuid) -> Result<Vec<AccountHistorySnapshot>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM sys_account_history
             WHERE account_id = ? ORDER BY record_date"
        ))?;
        let snapshots = stmt
            .query_map(params![account_id.to_string()], row_to_snapshot)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    /// Snapshots of all accounts, oldest first
    pub fn get_all_history(&self) -> Result<Vec<AccountHistorySnapshot>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM sys_account_history ORDER BY record_date, account_id"
        ))?;
        let snapshots = stmt
            .query_map([], row_to_snapshot)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(snapshots)
    }
}

impl LedgerRepository for DuckDbRepository {
    fn get_or_create<E: ReferenceEntity>(&self, entity: &E) -> Result<Resolved> {
        let conn = self.connection()?;

        if let Some(id) = find_reference_id(&conn, entity)? {
            return Ok(Resolved { id, created: false });
        }

        let id = Uuid::new_v4();
        let columns: Vec<&str> = std::iter::once("id")
            .chain(E::KEY_COLUMNS.iter().copied())
            .chain(E::VALUE_COLUMNS.iter().copied())
            .collect();
        let values: Vec<SqlValue> = entity
            .key_values()
            .into_iter()
            .chain(entity.insert_values())
            .collect();
        let placeholders = std::iter::once("?")
            .chain(values.iter().map(placeholder))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            placeholders
        );

        let mut insert_params: Vec<Box<dyn ToSql>> = vec![Box::new(id.to_string())];
        insert_params.extend(values.iter().map(to_sql_param));
        let param_refs: Vec<&dyn ToSql> = insert_params.iter().map(|b| b.as_ref()).collect();

        conn.execute(&sql, param_refs.as_slice())?;
        debug!(kind = E::KIND, key = %entity.describe_key(), "Created reference entity");

        Ok(Resolved { id, created: true })
    }

    fn find_id<E: ReferenceEntity>(&self, entity: &E) -> Result<Option<Uuid>> {
        let conn = self.connection()?;
        find_reference_id(&conn, entity)
    }

    fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome> {
        let conn = self.connection()?;

        let duplicates: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_transactions
             WHERE account_id = ? AND value_date = ?::DATE AND booking_date = ?::DATE
               AND transaction_type_id = ? AND amount = ?::DECIMAL(18, 2) AND purpose = ?
               AND counterparty_id = ? AND category_id = ?",
            params![
                tx.account_id.to_string(),
                tx.date.to_string(),
                tx.booking_date.to_string(),
                tx.transaction_type_id.to_string(),
                decimal_param(tx.amount),
                tx.purpose,
                tx.counterparty_id.to_string(),
                tx.category_id.to_string(),
            ],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            return Ok(InsertOutcome::Duplicate);
        }

        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO sys_transactions (id, account_id, value_date, booking_date,
                                           transaction_type_id, amount, purpose, purpose_addition,
                                           counterparty_id, category_id, reference)
             VALUES (?, ?, ?::DATE, ?::DATE, ?, ?::DECIMAL(18, 2), ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                tx.account_id.to_string(),
                tx.date.to_string(),
                tx.booking_date.to_string(),
                tx.transaction_type_id.to_string(),
                decimal_param(tx.amount),
                tx.purpose,
                tx.purpose_addition,
                tx.counterparty_id.to_string(),
                tx.category_id.to_string(),
                tx.reference,
            ],
        )?;

        Ok(InsertOutcome::Inserted(id))
    }

    fn insert_account_history(
        &self,
        snapshot: &NewSnapshot,
        manual_override: bool,
    ) -> Result<HistoryOutcome> {
        let conn = self.connection()?;

        let existing: Option<String> = optional(conn.query_row(
            "SELECT id FROM sys_account_history
             WHERE account_id = ? AND record_date = ?::DATE LIMIT 1",
            params![snapshot.account_id.to_string(), snapshot.record_date.to_string()],
            |row| row.get(0),
        ))?;

        match existing {
            Some(_) if !manual_override => Ok(HistoryOutcome::AlreadyExists),
            Some(id) => {
                conn.execute(
                    "UPDATE sys_account_history
                     SET balance = ?::DECIMAL(18, 2), change_date = ?::DATE, manual = ?
                     WHERE id = ?",
                    params![
                        decimal_param(snapshot.balance),
                        snapshot.change_date.to_string(),
                        snapshot.manual,
                        id
                    ],
                )?;
                Ok(HistoryOutcome::Replaced)
            }
            None => {
                conn.execute(
                    "INSERT INTO sys_account_history (id, account_id, balance, record_date, change_date, manual)
                     VALUES (?, ?, ?::DECIMAL(18, 2), ?::DATE, ?::DATE, ?)",
                    params![
                        Uuid::new_v4().to_string(),
                        snapshot.account_id.to_string(),
                        decimal_param(snapshot.balance),
                        snapshot.record_date.to_string(),
                        snapshot.change_date.to_string(),
                        snapshot.manual,
                    ],
                )?;
                Ok(HistoryOutcome::Inserted)
            }
        }
    }

    fn get_last_balance(&self, account_id: Uuid, before: NaiveDate) -> Result<Option<Decimal>> {
        let conn = self.connection()?;
        let balance: Option<String> = optional(conn.query_row(
            "SELECT balance::VARCHAR FROM sys_account_history
             WHERE account_id = ? AND record_date < ?::DATE
             ORDER BY record_date DESC LIMIT 1",
            params![account_id.to_string(), before.to_string()],
            |row| row.get(0),
        ))?;
        balance.map(|b| parse_decimal(&b)).transpose()
    }

    fn update_account(&self, update: &AccountUpdate) -> Result<UpdateOutcome> {
        let conn = self.connection()?;

        let current = optional(conn.query_row(
            "SELECT balance::VARCHAR, difference::VARCHAR, record_date::VARCHAR
             FROM sys_accounts WHERE id = ?",
            params![update.account_id.to_string()],
            |row| Ok((get_decimal(row, 0)?, get_decimal(row, 1)?, get_date(row, 2)?)),
        ))?;
        let Some((balance, difference, record_date)) = current else {
            return Ok(UpdateOutcome::NotFound);
        };

        if update.record_date < record_date {
            return Ok(UpdateOutcome::Stale);
        }

        let new_balance = to_money_scale(update.balance);
        let new_difference = to_money_scale(update.difference);
        if balance == new_balance
            && difference == new_difference
            && record_date == update.record_date
        {
            return Ok(UpdateOutcome::NoChange);
        }

        conn.execute(
            "UPDATE sys_accounts
             SET balance = ?::DECIMAL(18, 2), difference = ?::DECIMAL(18, 2),
                 record_date = ?::DATE, change_date = ?::DATE
             WHERE id = ?",
            params![
                decimal_param(new_balance),
                decimal_param(new_difference),
                update.record_date.to_string(),
                update.change_date.to_string(),
                update.account_id.to_string(),
            ],
        )?;

        Ok(UpdateOutcome::Updated)
    }

    fn begin(&self) -> Result<()> {
        self.connection()?.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.connection()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.connection()?.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

fn find_reference_id<E: ReferenceEntity>(conn: &Connection, entity: &E) -> Result<Option<Uuid>> {
    let keys = entity.key_values();
    let conditions = E::KEY_COLUMNS
        .iter()
        .zip(&keys)
        .map(|(column, value)| format!("{column} = {}", placeholder(value)))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!("SELECT id FROM {} WHERE {} LIMIT 1", E::TABLE, conditions);

    let key_params: Vec<Box<dyn ToSql>> = keys.iter().map(to_sql_param).collect();
    let param_refs: Vec<&dyn ToSql> = key_params.iter().map(|b| b.as_ref()).collect();

    optional(conn.query_row(&sql, param_refs.as_slice(), |row| get_uuid(row, 0)))
}

// Helper functions

fn to_sql_param(value: &SqlValue) -> Box<dyn ToSql> {
    match value {
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Decimal(d) => Box::new(decimal_param(*d)),
        SqlValue::Date(d) => Box::new(d.to_string()),
    }
}

fn placeholder(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Text(_) => "?",
        SqlValue::Decimal(_) => "?::DECIMAL(18, 2)",
        SqlValue::Date(_) => "?::DATE",
    }
}

/// Money columns are DECIMAL(18, 2)
const MONEY_SCALE: u32 = 2;

/// Round to the stored scale, half away from zero like a DECIMAL cast
fn to_money_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Decimal bound as text so the comparison and the stored value agree
fn decimal_param(value: Decimal) -> String {
    to_money_scale(value).to_string()
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s).map_err(|e| Error::database(format!("Invalid decimal '{s}': {e}")))
}

/// Map "no rows" to `None`
fn optional<T>(result: duckdb::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> duckdb::Error {
    duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_uuid(row: &duckdb::Row, idx: usize) -> duckdb::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))
}

fn get_decimal(row: &duckdb::Row, idx: usize) -> duckdb::Result<Decimal> {
    let s: String = row.get(idx)?;
    Decimal::from_str_exact(&s).map_err(|e| conversion_error(idx, e))
}

fn get_date(row: &duckdb::Row, idx: usize) -> duckdb::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
    let created_str: Option<String> = row.get(7)?;
    Ok(Account {
        id: get_uuid(row, 0)?,
        number: row.get(1)?,
        name: row.get(2)?,
        balance: get_decimal(row, 3)?,
        difference: get_decimal(row, 4)?,
        record_date: get_date(row, 5)?,
        change_date: get_date(row, 6)?,
        created_at: created_str.as_deref().map(parse_timestamp).unwrap_or_else(Utc::now),
    })
}

fn row_to_snapshot(row: &duckdb::Row) -> duckdb::Result<AccountHistorySnapshot> {
    Ok(AccountHistorySnapshot {
        id: get_uuid(row, 0)?,
        account_id: get_uuid(row, 1)?,
        balance: get_decimal(row, 2)?,
        record_date: get_date(row, 3)?,
        change_date: get_date(row, 4)?,
        manual: row.get(5)?,
    })
}

fn row_to_transaction(row: &duckdb::Row) -> duckdb::Result<Transaction> {
    let created_str: Option<String> = row.get(13)?;
    Ok(Transaction {
        id: get_uuid(row, 0)?,
        account_id: get_uuid(row, 1)?,
        date: get_date(row, 2)?,
        booking_date: get_date(row, 3)?,
        transaction_type_id: get_uuid(row, 4)?,
        amount: get_decimal(row, 5)?,
        purpose: row.get(6)?,
        purpose_addition: row.get(7)?,
        counterparty_id: get_uuid(row, 8)?,
        category_id: get_uuid(row, 9)?,
        reference: row.get(10)?,
        user_comments: row.get(11)?,
        displayed_name: row.get(12)?,
        created_at: created_str.as_deref().map(parse_timestamp).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewAccount, NewCategory, NewCounterparty, NewTransactionType};

    fn repository() -> DuckDbRepository {
        let repo = DuckDbRepository::open_in_memory().unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error("IO Error: database is locked"));
        assert!(is_retryable_error("The process cannot access the file"));
        assert!(!is_retryable_error("Catalog Error: Table does not exist"));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let repo = repository();
        let account = NewAccount::new("DE00ACCOUNT").with_balance(Decimal::new(10000, 2));

        let first = repo.get_or_create(&account).unwrap();
        assert!(first.created);
        let second = repo.get_or_create(&account.clone().named(Some("Other"))).unwrap();
        assert!(!second.created);
        assert_eq!(first.id, second.id);

        let stored = repo.get_account_by_number("DE00ACCOUNT").unwrap().unwrap();
        assert_eq!(stored.name, "Account DE00ACCOUNT");
        assert_eq!(stored.balance, Decimal::new(10000, 2));
        assert_eq!(stored.record_date, Account::initial_record_date());
    }

    #[test]
    fn test_default_category_exists() {
        let repo = repository();
        assert!(repo.find_id(&NewCategory::default()).unwrap().is_some());
        assert!(repo.find_id(&NewCategory::new("groceries")).unwrap().is_none());
    }

    #[test]
    fn test_transaction_type_key_is_name_and_code() {
        let repo = repository();
        let a = repo.get_or_create(&NewTransactionType::new("166", "GUTSCHRIFT")).unwrap();
        let b = repo.get_or_create(&NewTransactionType::new("152", "GUTSCHRIFT")).unwrap();
        assert!(a.created && b.created);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_insert_transaction_detects_duplicates() {
        let repo = repository();
        let account = repo.get_or_create(&NewAccount::new("ACC")).unwrap().id;
        let tx_type = repo.get_or_create(&NewTransactionType::new("166", "GUTSCHRIFT")).unwrap().id;
        let counterparty = repo.get_or_create(&NewCounterparty::new(None, None)).unwrap().id;
        let category = repo.get_or_create(&NewCategory::default()).unwrap().id;

        let tx = NewTransaction {
            account_id: account,
            date: date(2023, 1, 15),
            booking_date: date(2023, 1, 15),
            transaction_type_id: tx_type,
            amount: Decimal::new(5000, 2),
            purpose: "Rent".to_string(),
            purpose_addition: Some("SVWZ".to_string()),
            counterparty_id: counterparty,
            category_id: category,
            reference: Some("REF1".to_string()),
        };

        assert!(matches!(repo.insert_transaction(&tx).unwrap(), InsertOutcome::Inserted(_)));
        assert_eq!(repo.insert_transaction(&tx).unwrap(), InsertOutcome::Duplicate);

        // Reference does not take part in duplicate detection
        let other_reference = NewTransaction {
            reference: Some("REF2".to_string()),
            ..tx.clone()
        };
        assert_eq!(repo.insert_transaction(&other_reference).unwrap(), InsertOutcome::Duplicate);

        let other_amount = NewTransaction {
            amount: Decimal::new(5001, 2),
            ..tx
        };
        assert!(matches!(
            repo.insert_transaction(&other_amount).unwrap(),
            InsertOutcome::Inserted(_)
        ));

        let stored = repo.get_transactions_by_account(account).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].amount, Decimal::new(5000, 2));
        assert_eq!(stored[0].purpose_addition.as_deref(), Some("SVWZ"));
    }

    #[test]
    fn test_amounts_are_stored_at_cent_scale() {
        let repo = repository();
        let account = repo.get_or_create(&NewAccount::new("ACC")).unwrap().id;
        let tx_type = repo.get_or_create(&NewTransactionType::new("166", "GUTSCHRIFT")).unwrap().id;
        let counterparty = repo.get_or_create(&NewCounterparty::new(None, None)).unwrap().id;
        let category = repo.get_or_create(&NewCategory::default()).unwrap().id;

        let tx = NewTransaction {
            account_id: account,
            date: date(2023, 1, 15),
            booking_date: date(2023, 1, 15),
            transaction_type_id: tx_type,
            amount: Decimal::new(50125, 3),
            purpose: "Rent".to_string(),
            purpose_addition: None,
            counterparty_id: counterparty,
            category_id: category,
            reference: None,
        };

        assert!(matches!(repo.insert_transaction(&tx).unwrap(), InsertOutcome::Inserted(_)));
        assert_eq!(repo.insert_transaction(&tx).unwrap(), InsertOutcome::Duplicate);

        let stored = repo.get_transactions_by_account(account).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, Decimal::new(5013, 2));

        let snapshot = NewSnapshot {
            account_id: account,
            balance: Decimal::new(150125, 3),
            record_date: date(2023, 1, 31),
            change_date: date(2023, 2, 1),
            manual: false,
        };
        repo.insert_account_history(&snapshot, false).unwrap();
        assert_eq!(
            repo.get_last_balance(account, date(2023, 2, 1)).unwrap(),
            Some(Decimal::new(15013, 2))
        );
    }

    #[test]
    fn test_account_history_and_last_balance() {
        let repo = repository();
        let account_id = repo.get_or_create(&NewAccount::new("ACC")).unwrap().id;
        let snapshot = |d: NaiveDate, cents: i64| NewSnapshot {
            account_id,
            balance: Decimal::new(cents, 2),
            record_date: d,
            change_date: date(2023, 6, 1),
            manual: false,
        };

        assert_eq!(
            repo.insert_account_history(&snapshot(date(2023, 1, 31), 13000), false).unwrap(),
            HistoryOutcome::Inserted
        );
        assert_eq!(
            repo.insert_account_history(&snapshot(date(2023, 1, 31), 99900), false).unwrap(),
            HistoryOutcome::AlreadyExists
        );
        repo.insert_account_history(&snapshot(date(2023, 2, 28), 15000), false).unwrap();

        assert_eq!(repo.get_last_balance(account_id, date(2023, 1, 31)).unwrap(), None);
        assert_eq!(
            repo.get_last_balance(account_id, date(2023, 2, 28)).unwrap(),
            Some(Decimal::new(13000, 2))
        );
        assert_eq!(
            repo.get_last_balance(account_id, date(2024, 1, 1)).unwrap(),
            Some(Decimal::new(15000, 2))
        );

        let history = repo.get_account_history(account_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].balance, Decimal::new(13000, 2));
    }

    #[test]
    fn test_manual_override_replaces_snapshot() {
        let repo = repository();
        let account_id = repo.get_or_create(&NewAccount::new("ACC")).unwrap().id;
        let mut snapshot = NewSnapshot {
            account_id,
            balance: Decimal::new(100, 0),
            record_date: date(2023, 3, 1),
            change_date: date(2023, 3, 2),
            manual: false,
        };
        repo.insert_account_history(&snapshot, false).unwrap();

        snapshot.balance = Decimal::new(120, 0);
        snapshot.manual = true;
        assert_eq!(
            repo.insert_account_history(&snapshot, true).unwrap(),
            HistoryOutcome::Replaced
        );

        let history = repo.get_account_history(account_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].balance, Decimal::new(120, 0));
        assert!(history[0].manual);
    }

    #[test]
    fn test_update_account_outcomes() {
        let repo = repository();
        let account_id = repo.get_or_create(&NewAccount::new("ACC")).unwrap().id;
        let update = AccountUpdate {
            account_id,
            balance: Decimal::new(13000, 2),
            difference: Decimal::new(13000, 2),
            record_date: date(2023, 1, 31),
            change_date: date(2023, 2, 1),
        };

        assert_eq!(repo.update_account(&update).unwrap(), UpdateOutcome::Updated);
        assert_eq!(repo.update_account(&update).unwrap(), UpdateOutcome::NoChange);

        // Change date alone does not count as a change
        let later_run = AccountUpdate {
            change_date: date(2023, 3, 1),
            ..update.clone()
        };
        assert_eq!(repo.update_account(&later_run).unwrap(), UpdateOutcome::NoChange);

        let older = AccountUpdate {
            record_date: date(2022, 12, 31),
            ..update.clone()
        };
        assert_eq!(repo.update_account(&older).unwrap(), UpdateOutcome::Stale);

        let missing = AccountUpdate {
            account_id: Uuid::new_v4(),
            ..update
        };
        assert_eq!(repo.update_account(&missing).unwrap(), UpdateOutcome::NotFound);

        let stored = repo.get_account_by_id(account_id).unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::new(13000, 2));
        assert_eq!(stored.record_date, date(2023, 1, 31));
        assert_eq!(stored.change_date, date(2023, 2, 1));
    }

    #[test]
    fn test_rollback_discards_writes() {
        let repo = repository();
        repo.begin().unwrap();
        repo.get_or_create(&NewAccount::new("ACC")).unwrap();
        repo.rollback().unwrap();
        assert!(repo.get_accounts().unwrap().is_empty());

        repo.begin().unwrap();
        repo.get_or_create(&NewAccount::new("ACC")).unwrap();
        repo.commit().unwrap();
        assert_eq!(repo.get_accounts().unwrap().len(), 1);
    }
}
