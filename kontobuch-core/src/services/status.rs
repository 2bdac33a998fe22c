//! Status service - account and ledger summaries

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;

/// Status service for account summaries
pub struct StatusService {
    repository: Arc<DuckDbRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let accounts = self.repository.get_accounts()?;
        let (earliest, latest) = self.repository.get_transaction_date_range()?;

        Ok(StatusSummary {
            total_accounts: accounts.len() as i64,
            total_transactions: self.repository.get_transaction_count()?,
            total_snapshots: self.repository.get_history_count()?,
            total_counterparties: self.repository.get_counterparty_count()?,
            total_balance: accounts.iter().map(|a| a.balance).sum(),
            accounts: accounts
                .into_iter()
                .map(|a| AccountSummary {
                    number: a.number,
                    name: a.name,
                    balance: a.balance,
                    difference: a.difference,
                    record_date: a.record_date,
                    change_date: a.change_date,
                })
                .collect(),
            date_range: DateRange { earliest, latest },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    pub total_transactions: i64,
    pub total_snapshots: i64,
    pub total_counterparties: i64,
    pub total_balance: Decimal,
    pub accounts: Vec<AccountSummary>,
    pub date_range: DateRange,
}

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub number: String,
    pub name: String,
    pub balance: Decimal,
    pub difference: Decimal,
    pub record_date: NaiveDate,
    pub change_date: NaiveDate,
}

/// Value dates of the oldest and newest transaction
#[derive(Debug, Serialize)]
pub struct DateRange {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}
