//! Account history domain model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closing balance of an account on a given day
///
/// There is at most one snapshot per account and record date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHistorySnapshot {
    pub id: Uuid,
    pub account_id: Uuid,
    pub balance: Decimal,
    pub record_date: NaiveDate,
    /// Day the snapshot was written
    pub change_date: NaiveDate,
    /// True if entered by hand rather than imported
    pub manual: bool,
}

/// Sum of all account balances on a day
///
/// Accounts without a snapshot on that day contribute their latest earlier
/// balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashPoint {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Closing balance to be stored for an account
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub account_id: Uuid,
    pub balance: Decimal,
    pub record_date: NaiveDate,
    /// Day the snapshot is written
    pub change_date: NaiveDate,
    pub manual: bool,
}
