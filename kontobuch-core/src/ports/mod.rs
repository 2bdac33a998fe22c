//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The reconciliation
//! engine depends only on these traits, not on concrete implementations.

mod naming;
mod repository;

pub use naming::{AccountNamer, HeadlessNamer};
pub use repository::{HistoryOutcome, InsertOutcome, LedgerRepository, Resolved, UpdateOutcome};
