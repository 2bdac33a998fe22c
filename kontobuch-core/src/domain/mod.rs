//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod category;
mod counterparty;
mod history;
pub mod reference;
pub mod result;
mod transaction;
mod transaction_type;

pub use account::{Account, AccountUpdate, NewAccount};
pub use category::{NewCategory, DEFAULT_CATEGORY};
pub use counterparty::NewCounterparty;
pub use history::{AccountHistorySnapshot, CashPoint, NewSnapshot};
pub use reference::{ReferenceEntity, SqlValue};
pub use transaction::{NewTransaction, Transaction, TransactionView};
pub use transaction_type::NewTransactionType;
