//! Category domain model

use super::reference::{ReferenceEntity, SqlValue};

/// Category assigned to imported transactions until the user recategorizes
pub const DEFAULT_CATEGORY: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NewCategory {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY)
    }
}

impl ReferenceEntity for NewCategory {
    const KIND: &'static str = "category";
    const TABLE: &'static str = "sys_categories";
    const KEY_COLUMNS: &'static [&'static str] = &["name"];
    const VALUE_COLUMNS: &'static [&'static str] = &[];

    fn key_values(&self) -> Vec<SqlValue> {
        vec![self.name.as_str().into()]
    }

    fn insert_values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}
