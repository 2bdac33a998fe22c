//! Repository port - ledger storage abstraction

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{AccountUpdate, NewSnapshot, NewTransaction, ReferenceEntity};

/// Ledger storage used by the reconciliation engine
///
/// Only storage failures are errors. Duplicates, existing snapshots and
/// rejected updates are ordinary outcomes the caller counts.
pub trait LedgerRepository {
    // === Reference data ===

    /// Look up an entity by its natural key, inserting it if absent
    fn get_or_create<E: ReferenceEntity>(&self, entity: &E) -> Result<Resolved>;

    /// Look up an entity by its natural key
    fn find_id<E: ReferenceEntity>(&self, entity: &E) -> Result<Option<Uuid>>;

    // === Transactions ===

    /// Insert a transaction unless an identical one is stored
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome>;

    // === Account history ===

    /// Store a snapshot, keeping an existing one for the same day unless
    /// `manual_override` is set
    fn insert_account_history(
        &self,
        snapshot: &NewSnapshot,
        manual_override: bool,
    ) -> Result<HistoryOutcome>;

    /// Balance of the latest snapshot strictly before `before`
    fn get_last_balance(&self, account_id: Uuid, before: NaiveDate) -> Result<Option<Decimal>>;

    // === Accounts ===

    /// Write new balance values unless they are older than the stored ones
    fn update_account(&self, update: &AccountUpdate) -> Result<UpdateOutcome>;

    // === Transaction scope ===

    fn begin(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;
}

/// Id of a reference entity and whether this call created it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: Uuid,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    Inserted,
    /// A snapshot for the same day was overwritten
    Replaced,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// Stored values already match
    NoChange,
    /// The stored record date is newer than the update's
    Stale,
    NotFound,
}
