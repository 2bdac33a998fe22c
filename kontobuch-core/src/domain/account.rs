//! Account domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reference::{ReferenceEntity, SqlValue};

/// A bank account, identified by its account number
///
/// `balance`, `difference` and `record_date` describe the most recent
/// closing balance that was accepted for this account. They only move
/// forward in time: an update carrying an older record date is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub number: String,
    pub name: String,
    pub balance: Decimal,
    /// Balance minus the snapshot preceding `record_date`
    pub difference: Decimal,
    pub record_date: NaiveDate,
    /// Day the stored values were last changed
    pub change_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Record date given to accounts that have never seen a closing balance
    pub fn initial_record_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2001, 1, 1).unwrap_or_default()
    }

    /// Name used when nobody supplied one for a new account
    pub fn placeholder_name(number: &str) -> String {
        format!("Account {}", number.trim())
    }
}

/// Account creation request, also used as lookup probe by number
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub number: String,
    pub name: String,
    pub balance: Decimal,
    pub difference: Decimal,
    pub record_date: NaiveDate,
    pub change_date: NaiveDate,
}

impl NewAccount {
    /// A new account with zero balance and the initial record date
    pub fn new(number: impl Into<String>) -> Self {
        let number = number.into();
        Self {
            name: Account::placeholder_name(&number),
            number,
            balance: Decimal::ZERO,
            difference: Decimal::ZERO,
            record_date: Account::initial_record_date(),
            change_date: Utc::now().date_naive(),
        }
    }

    /// Use the given name unless it is blank
    pub fn named(mut self, name: Option<&str>) -> Self {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        self
    }

    /// Seed the balance, typically with the statement's opening balance
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }
}

impl ReferenceEntity for NewAccount {
    const KIND: &'static str = "account";
    const TABLE: &'static str = "sys_accounts";
    const KEY_COLUMNS: &'static [&'static str] = &["number"];
    const VALUE_COLUMNS: &'static [&'static str] =
        &["name", "balance", "difference", "record_date", "change_date"];

    fn key_values(&self) -> Vec<SqlValue> {
        vec![self.number.as_str().into()]
    }

    fn insert_values(&self) -> Vec<SqlValue> {
        vec![
            self.name.as_str().into(),
            self.balance.into(),
            self.difference.into(),
            self.record_date.into(),
            self.change_date.into(),
        ]
    }
}

/// Values written by the diff-and-update step
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub account_id: Uuid,
    pub balance: Decimal,
    pub difference: Decimal,
    pub record_date: NaiveDate,
    pub change_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_defaults() {
        let account = NewAccount::new("DE00ACCOUNT");
        assert_eq!(account.name, "Account DE00ACCOUNT");
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.record_date, NaiveDate::from_ymd_opt(2001, 1, 1).unwrap());
    }

    #[test]
    fn test_blank_name_keeps_placeholder() {
        let account = NewAccount::new("123").named(Some("   "));
        assert_eq!(account.name, "Account 123");

        let account = NewAccount::new("123").named(Some(" Giro "));
        assert_eq!(account.name, "Giro");
    }

    #[test]
    fn test_key_and_values_line_up() {
        let account = NewAccount::new("123");
        assert_eq!(account.key_values().len(), NewAccount::KEY_COLUMNS.len());
        assert_eq!(account.insert_values().len(), NewAccount::VALUE_COLUMNS.len());
    }
}
