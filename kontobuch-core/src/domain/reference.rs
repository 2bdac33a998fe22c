//! Reference data resolved by natural key
//!
//! Accounts, counterparties, transaction types and categories are all
//! looked up by a business key and created on first sight. They share one
//! generic get-or-create in the repository, parameterized by this trait.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A column value bound into a reference-data query
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<Decimal> for SqlValue {
    fn from(d: Decimal) -> Self {
        SqlValue::Decimal(d)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(d: NaiveDate) -> Self {
        SqlValue::Date(d)
    }
}

/// An entity kind that is identified by a natural key
///
/// `KEY_COLUMNS` and `key_values()` must line up one to one, as must
/// `VALUE_COLUMNS` and `insert_values()`. The value columns are written only
/// when the row is created; an existing row is never modified.
pub trait ReferenceEntity {
    /// Human readable kind, used in logs and error messages
    const KIND: &'static str;
    const TABLE: &'static str;
    const KEY_COLUMNS: &'static [&'static str];
    const VALUE_COLUMNS: &'static [&'static str];

    fn key_values(&self) -> Vec<SqlValue>;

    fn insert_values(&self) -> Vec<SqlValue>;

    /// Short description of the key for diagnostics
    fn describe_key(&self) -> String {
        self.key_values()
            .iter()
            .map(|v| match v {
                SqlValue::Text(s) => s.clone(),
                SqlValue::Decimal(d) => d.to_string(),
                SqlValue::Date(d) => d.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
