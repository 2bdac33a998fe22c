//! Counterparty domain model

use super::reference::{ReferenceEntity, SqlValue};

/// Counterparty creation request
///
/// The name is only written when the counterparty is first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCounterparty {
    pub number: String,
    pub name: String,
}

impl NewCounterparty {
    pub fn new(number: Option<&str>, name: Option<&str>) -> Self {
        Self {
            number: number.unwrap_or_default().trim().to_string(),
            name: name.unwrap_or_default().trim().to_string(),
        }
    }
}

impl ReferenceEntity for NewCounterparty {
    const KIND: &'static str = "counterparty";
    const TABLE: &'static str = "sys_counterparties";
    const KEY_COLUMNS: &'static [&'static str] = &["number"];
    const VALUE_COLUMNS: &'static [&'static str] = &["name"];

    fn key_values(&self) -> Vec<SqlValue> {
        vec![self.number.as_str().into()]
    }

    fn insert_values(&self) -> Vec<SqlValue> {
        vec![self.name.as_str().into()]
    }
}
