//! History service - balance history per account and across accounts

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::Error;
use crate::domain::{AccountHistorySnapshot, CashPoint};

/// Inclusive date filter; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Service for balance history queries
pub struct HistoryService {
    repository: Arc<DuckDbRepository>,
}

impl HistoryService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Snapshots of one account, oldest first
    pub fn account_history(
        &self,
        account_number: &str,
        filter: DateFilter,
    ) -> Result<Vec<AccountHistorySnapshot>> {
        let account = self
            .repository
            .get_account_by_number(account_number)?
            .ok_or_else(|| Error::not_found(format!("account {}", account_number.trim())))?;

        let snapshots = self.repository.get_account_history(account.id)?;
        Ok(snapshots
            .into_iter()
            .filter(|s| filter.contains(s.record_date))
            .collect())
    }

    /// Total balance across all accounts on every snapshot date
    pub fn cash_timeline(&self, filter: DateFilter) -> Result<Vec<CashPoint>> {
        let snapshots = self.repository.get_all_history()?;
        Ok(total_cash_timeline(&snapshots, filter))
    }
}

/// Sum account balances over the union of snapshot dates
///
/// On each date every account contributes its latest balance recorded on
/// or before that date; accounts without any snapshot yet contribute
/// nothing. Dates outside `filter` are not emitted but still advance the
/// running balances.
pub fn total_cash_timeline(
    snapshots: &[AccountHistorySnapshot],
    filter: DateFilter,
) -> Vec<CashPoint> {
    let mut ordered: Vec<&AccountHistorySnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.record_date);

    let mut balances: HashMap<Uuid, Decimal> = HashMap::new();
    let mut points: Vec<CashPoint> = Vec::new();

    for (index, snapshot) in ordered.iter().enumerate() {
        balances.insert(snapshot.account_id, snapshot.balance);

        let last_of_day = ordered
            .get(index + 1)
            .map_or(true, |next| next.record_date != snapshot.record_date);
        if last_of_day && filter.contains(snapshot.record_date) {
            points.push(CashPoint {
                date: snapshot.record_date,
                total: balances.values().copied().sum(),
            });
        }
    }

    points
}
