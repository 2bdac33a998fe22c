//! Reconciliation - merges parsed statements into the ledger
//!
//! Each parsed transaction is resolved against reference data (account,
//! transaction type, counterparty, category) and inserted unless an
//! identical row exists. Closing balances then become history snapshots,
//! and each account is moved to its latest closing balance.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountUpdate, NewAccount, NewCategory, NewCounterparty, NewSnapshot, NewTransaction,
    NewTransactionType, DEFAULT_CATEGORY,
};
use crate::ports::{
    AccountNamer, HistoryOutcome, InsertOutcome, LedgerRepository, UpdateOutcome,
};
use crate::statement::{ClosingBalance, ParsedTransaction};

/// What an import (or part of one) did to the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub transactions_parsed: usize,
    pub accounts_created: usize,
    pub counterparties_created: usize,
    pub transaction_types_created: usize,
    pub transactions_inserted: usize,
    pub transactions_duplicate: usize,
    pub snapshots_inserted: usize,
    pub snapshots_replaced: usize,
    pub snapshots_existing: usize,
    pub accounts_updated: usize,
    pub updates_unchanged: usize,
    pub updates_stale: usize,
}

impl ImportSummary {
    /// Number of rows inserted or changed
    pub fn rows_written(&self) -> usize {
        self.accounts_created
            + self.counterparties_created
            + self.transaction_types_created
            + self.transactions_inserted
            + self.snapshots_inserted
            + self.snapshots_replaced
            + self.accounts_updated
    }

    /// Summary of a rolled back run: nothing was kept
    pub fn discarded(&self) -> Self {
        Self {
            transactions_parsed: self.transactions_parsed,
            ..Self::default()
        }
    }
}

/// A fatal failure during reconciliation, with the progress made before it
#[derive(Debug, Error)]
#[error("Import aborted after {} rows written: {source}", .summary.rows_written())]
pub struct ImportError {
    pub summary: ImportSummary,
    pub source: Error,
}

/// Applies parsed transactions to a [`LedgerRepository`]
///
/// The engine does not open or close transactions; the caller decides
/// whether a run is atomic.
pub struct ReconciliationEngine<'a, R, N: ?Sized> {
    repository: &'a R,
    namer: &'a N,
    category: String,
    today: NaiveDate,
}

impl<'a, R, N> ReconciliationEngine<'a, R, N>
where
    R: LedgerRepository,
    N: AccountNamer + ?Sized,
{
    pub fn new(repository: &'a R, namer: &'a N) -> Self {
        Self {
            repository,
            namer,
            category: DEFAULT_CATEGORY.to_string(),
            today: Utc::now().date_naive(),
        }
    }

    /// Category assigned to imported transactions
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        if !category.trim().is_empty() {
            self.category = category.trim().to_string();
        }
        self
    }

    /// Date written as change date of accounts and snapshots
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Import all transactions, then apply their closing balances
    pub fn reconcile(
        &self,
        transactions: &[ParsedTransaction],
    ) -> std::result::Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary {
            transactions_parsed: transactions.len(),
            ..ImportSummary::default()
        };

        match self.run(transactions, &mut summary) {
            Ok(()) => {
                info!(
                    parsed = summary.transactions_parsed,
                    inserted = summary.transactions_inserted,
                    duplicates = summary.transactions_duplicate,
                    snapshots = summary.snapshots_inserted,
                    "Reconciliation finished"
                );
                Ok(summary)
            }
            Err(source) => Err(ImportError { summary, source }),
        }
    }

    fn run(&self, transactions: &[ParsedTransaction], summary: &mut ImportSummary) -> Result<()> {
        let category_id = self
            .repository
            .get_or_create(&NewCategory::new(self.category.as_str()))?
            .id;
        let mut accounts = HashMap::new();

        for tx in transactions {
            self.import_transaction(tx, category_id, &mut accounts, summary)?;
        }

        let closing_balances: Vec<ClosingBalance> = transactions
            .iter()
            .filter_map(|tx| tx.closing_balance.clone())
            .collect();
        self.apply_closing_balances(&closing_balances, summary)
    }

    fn import_transaction(
        &self,
        tx: &ParsedTransaction,
        category_id: Uuid,
        accounts: &mut HashMap<String, Uuid>,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let account_id = match accounts.get(&tx.account) {
            Some(id) => *id,
            None => {
                let id = self.resolve_account(tx, summary)?;
                accounts.insert(tx.account.clone(), id);
                id
            }
        };

        let tx_type = self.repository.get_or_create(&NewTransactionType::new(
            tx.transaction_type_code.as_str(),
            tx.transaction_type_name.as_str(),
        ))?;
        if tx_type.created {
            summary.transaction_types_created += 1;
        }

        let counterparty = self.repository.get_or_create(&NewCounterparty::new(
            tx.counterparty_account.as_deref(),
            tx.counterparty_name.as_deref(),
        ))?;
        if counterparty.created {
            summary.counterparties_created += 1;
        }

        let outcome = self.repository.insert_transaction(&NewTransaction {
            account_id,
            date: tx.date,
            booking_date: tx.booking_date,
            transaction_type_id: tx_type.id,
            amount: tx.amount,
            purpose: tx.purpose.clone(),
            purpose_addition: tx.purpose_addition.clone(),
            counterparty_id: counterparty.id,
            category_id,
            reference: tx.reference.clone(),
        })?;

        match outcome {
            InsertOutcome::Inserted(id) => {
                debug!(%id, date = %tx.date, "Inserted transaction");
                summary.transactions_inserted += 1;
            }
            InsertOutcome::Duplicate => {
                debug!(date = %tx.date, "Skipped duplicate transaction");
                summary.transactions_duplicate += 1;
            }
        }

        Ok(())
    }

    /// Find the account by number, creating it (after asking for a name)
    /// when it is new
    fn resolve_account(&self, tx: &ParsedTransaction, summary: &mut ImportSummary) -> Result<Uuid> {
        let probe = NewAccount::new(tx.account.as_str());
        if let Some(id) = self.repository.find_id(&probe)? {
            return Ok(id);
        }

        let answer = self.namer.prompt_for_account_name(&tx.account);
        let mut account = probe
            .named(answer.as_deref())
            .with_balance(tx.opening_balance.unwrap_or(Decimal::ZERO));
        account.change_date = self.today;

        let resolved = self.repository.get_or_create(&account)?;
        if resolved.created {
            info!(name = %account.name, "Created account");
            summary.accounts_created += 1;
        }
        Ok(resolved.id)
    }

    /// Store closing balances as snapshots and move each account to its
    /// latest one
    ///
    /// Every balance becomes a snapshot. Only the latest balance per account
    /// (by date, later entries winning ties) updates the account row.
    pub fn apply_closing_balances(
        &self,
        balances: &[ClosingBalance],
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let mut latest: BTreeMap<&str, &ClosingBalance> = BTreeMap::new();
        let mut account_ids: HashMap<&str, Uuid> = HashMap::new();

        for balance in balances {
            let account_id = match account_ids.get(balance.account.as_str()) {
                Some(id) => *id,
                None => {
                    let id = self.require_account(&balance.account)?;
                    account_ids.insert(balance.account.as_str(), id);
                    id
                }
            };

            self.record_snapshot(
                &NewSnapshot {
                    account_id,
                    balance: balance.balance,
                    record_date: balance.date,
                    change_date: self.today,
                    manual: false,
                },
                false,
                summary,
            )?;

            let entry = latest.entry(balance.account.as_str()).or_insert(balance);
            if balance.date >= entry.date {
                *entry = balance;
            }
        }

        for (number, balance) in latest {
            let account_id = account_ids
                .get(number)
                .copied()
                .ok_or_else(|| Error::not_found(format!("account {number}")))?;
            self.update_balance(account_id, balance.balance, balance.date, summary)?;
        }

        Ok(())
    }

    /// Store one snapshot and count the outcome
    pub fn record_snapshot(
        &self,
        snapshot: &NewSnapshot,
        manual_override: bool,
        summary: &mut ImportSummary,
    ) -> Result<HistoryOutcome> {
        let outcome = self
            .repository
            .insert_account_history(snapshot, manual_override)?;
        match outcome {
            HistoryOutcome::Inserted => summary.snapshots_inserted += 1,
            HistoryOutcome::Replaced => summary.snapshots_replaced += 1,
            HistoryOutcome::AlreadyExists => {
                debug!(date = %snapshot.record_date, "Snapshot already recorded");
                summary.snapshots_existing += 1;
            }
        }
        Ok(outcome)
    }

    /// Diff against the previous snapshot and update the account
    ///
    /// The difference is taken against the latest snapshot strictly before
    /// `record_date` (zero if there is none).
    pub fn update_balance(
        &self,
        account_id: Uuid,
        balance: Decimal,
        record_date: NaiveDate,
        summary: &mut ImportSummary,
    ) -> Result<UpdateOutcome> {
        let previous = self
            .repository
            .get_last_balance(account_id, record_date)?
            .unwrap_or(Decimal::ZERO);
        let difference = (balance - previous).round_dp(2);

        let outcome = self.repository.update_account(&AccountUpdate {
            account_id,
            balance,
            difference,
            record_date,
            change_date: self.today,
        })?;

        match outcome {
            UpdateOutcome::Updated => summary.accounts_updated += 1,
            UpdateOutcome::NoChange => summary.updates_unchanged += 1,
            UpdateOutcome::Stale => {
                warn!(%account_id, date = %record_date, "Closing balance older than stored balance, not applied");
                summary.updates_stale += 1;
            }
            UpdateOutcome::NotFound => {
                return Err(Error::not_found(format!("account {account_id}")));
            }
        }
        Ok(outcome)
    }

    fn require_account(&self, number: &str) -> Result<Uuid> {
        self.repository
            .find_id(&NewAccount::new(number))?
            .ok_or_else(|| Error::not_found(format!("account {number}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::ports::HeadlessNamer;
    use crate::statement::parse_statement;

    const SAMPLE: &str = "\
:20:REF1
:25:DE00ACCOUNT
:60F:C230101EUR100,00
:61:2301150115CR50,00NTRFNONREF
:86:166?00GUTSCHRIFT?20SVWZ+Rent?31DE11111111?32Landlord
:61:2301200120DR20,00NDDTNONREF
:86:105?00LASTSCHRIFT?20EREF+Shop?31DE22222222?32Shop GmbH
:62F:C230131EUR130,00
";

    fn repository() -> DuckDbRepository {
        let repo = DuckDbRepository::open_in_memory().unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reconcile_sample() {
        let repo = repository();
        let parsed = parse_statement(SAMPLE).unwrap();
        let engine = ReconciliationEngine::new(&repo, &HeadlessNamer).with_today(date(2023, 2, 1));

        let summary = engine.reconcile(&parsed).unwrap();
        assert_eq!(summary.transactions_parsed, 2);
        assert_eq!(summary.accounts_created, 1);
        assert_eq!(summary.transaction_types_created, 2);
        assert_eq!(summary.counterparties_created, 2);
        assert_eq!(summary.transactions_inserted, 2);
        assert_eq!(summary.snapshots_inserted, 1);
        assert_eq!(summary.accounts_updated, 1);

        let account = repo.get_account_by_number("DE00ACCOUNT").unwrap().unwrap();
        assert_eq!(account.name, "Account DE00ACCOUNT");
        assert_eq!(account.balance, Decimal::new(13000, 2));
        assert_eq!(account.difference, Decimal::new(13000, 2));
        assert_eq!(account.record_date, date(2023, 1, 31));
        assert_eq!(account.change_date, date(2023, 2, 1));

        let history = repo.get_account_history(account.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].record_date, date(2023, 1, 31));
        assert_eq!(history[0].change_date, date(2023, 2, 1));
    }

    #[test]
    fn test_second_run_only_counts_duplicates() {
        let repo = repository();
        let parsed = parse_statement(SAMPLE).unwrap();
        let engine = ReconciliationEngine::new(&repo, &HeadlessNamer);

        engine.reconcile(&parsed).unwrap();
        let second = engine.reconcile(&parsed).unwrap();

        assert_eq!(second.rows_written(), 0);
        assert_eq!(second.transactions_duplicate, 2);
        assert_eq!(second.snapshots_existing, 1);
        assert_eq!(second.updates_unchanged, 1);
    }

    #[test]
    fn test_namer_answer_is_used() {
        let repo = repository();
        let parsed = parse_statement(SAMPLE).unwrap();
        let namer = |number: &str| Some(format!("Giro {number}"));

        ReconciliationEngine::new(&repo, &namer).reconcile(&parsed).unwrap();

        let account = repo.get_account_by_number("DE00ACCOUNT").unwrap().unwrap();
        assert_eq!(account.name, "Giro DE00ACCOUNT");
    }

    #[test]
    fn test_missing_account_for_closing_balance_is_fatal() {
        let repo = repository();
        let engine = ReconciliationEngine::new(&repo, &HeadlessNamer);
        let mut summary = ImportSummary::default();

        let err = engine
            .apply_closing_balances(
                &[ClosingBalance {
                    account: "UNKNOWN".to_string(),
                    date: date(2023, 1, 31),
                    balance: Decimal::ONE,
                }],
                &mut summary,
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_only_latest_balance_updates_account() {
        let repo = repository();
        let engine = ReconciliationEngine::new(&repo, &HeadlessNamer);
        let account_id = repo.get_or_create(&NewAccount::new("ACC")).unwrap().id;
        let balance = |d: NaiveDate, v: i64| ClosingBalance {
            account: "ACC".to_string(),
            date: d,
            balance: Decimal::new(v, 0),
        };

        let mut summary = ImportSummary::default();
        engine
            .apply_closing_balances(
                &[balance(date(2023, 2, 28), 200), balance(date(2023, 1, 31), 100)],
                &mut summary,
            )
            .unwrap();

        assert_eq!(summary.snapshots_inserted, 2);
        assert_eq!(summary.accounts_updated, 1);

        let account = repo.get_account_by_id(account_id).unwrap().unwrap();
        assert_eq!(account.balance, Decimal::new(200, 0));
        assert_eq!(account.difference, Decimal::new(100, 0));
        assert_eq!(account.record_date, date(2023, 2, 28));
    }

    #[test]
    fn test_import_summary_discarded() {
        let summary = ImportSummary {
            transactions_parsed: 4,
            transactions_inserted: 3,
            ..ImportSummary::default()
        };
        let discarded = summary.discarded();
        assert_eq!(discarded.transactions_parsed, 4);
        assert_eq!(discarded.rows_written(), 0);
    }
}
