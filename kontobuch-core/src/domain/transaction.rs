//! Transaction domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A booked transaction as stored in the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Value date
    pub date: NaiveDate,
    pub booking_date: NaiveDate,
    pub transaction_type_id: Uuid,
    /// Signed amount: credits positive, debits negative
    pub amount: Decimal,
    pub purpose: String,
    /// SEPA marker stripped from the purpose (`SVWZ`, `EREF`, `KREF`)
    pub purpose_addition: Option<String>,
    pub counterparty_id: Uuid,
    pub category_id: Uuid,
    /// Statement reference (`:20:`) the transaction was imported from
    pub reference: Option<String>,
    pub user_comments: Option<String>,
    pub displayed_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields written when importing a transaction
///
/// Duplicate detection compares account, dates, type, amount, purpose,
/// counterparty and category. Reference, purpose addition, comments and
/// display name are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub booking_date: NaiveDate,
    pub transaction_type_id: Uuid,
    pub amount: Decimal,
    pub purpose: String,
    pub purpose_addition: Option<String>,
    pub counterparty_id: Uuid,
    pub category_id: Uuid,
    pub reference: Option<String>,
}

/// Transaction joined with its reference data, for listings
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub account_number: String,
    pub date: NaiveDate,
    pub booking_date: NaiveDate,
    pub amount: Decimal,
    pub purpose: String,
    pub transaction_type: String,
    pub counterparty: String,
    pub category: String,
}
