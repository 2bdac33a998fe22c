//! Transaction type domain model

use super::reference::{ReferenceEntity, SqlValue};

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionType {
    pub code: String,
    pub name: String,
}

impl NewTransactionType {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl ReferenceEntity for NewTransactionType {
    const KIND: &'static str = "transaction type";
    const TABLE: &'static str = "sys_transaction_types";
    const KEY_COLUMNS: &'static [&'static str] = &["name", "code"];
    const VALUE_COLUMNS: &'static [&'static str] = &[];

    fn key_values(&self) -> Vec<SqlValue> {
        vec![self.name.as_str().into(), self.code.as_str().into()]
    }

    fn insert_values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}
