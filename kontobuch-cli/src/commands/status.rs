//! Status command - show accounts and ledger summary

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;
use crate::output::{create_table, money, signed_money};

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context("status")?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Ledger Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Accounts", &status.total_accounts.to_string()]);
    table.add_row(vec!["Transactions", &status.total_transactions.to_string()]);
    table.add_row(vec!["Balance Snapshots", &status.total_snapshots.to_string()]);
    table.add_row(vec!["Counterparties", &status.total_counterparties.to_string()]);
    table.add_row(vec!["Total Balance", &money(status.total_balance)]);

    println!("{}", table);
    println!();

    if let (Some(earliest), Some(latest)) = (&status.date_range.earliest, &status.date_range.latest) {
        println!("Date range: {} to {}", earliest, latest);
        println!();
    }

    if status.accounts.is_empty() {
        println!("No accounts yet. Import a statement with `kb import <file>`.");
        return Ok(());
    }

    let mut accounts = create_table();
    accounts.set_header(vec!["Number", "Name", "Balance", "Difference", "As of", "Changed"]);
    for account in &status.accounts {
        accounts.add_row(vec![
            account.number.clone(),
            account.name.clone(),
            money(account.balance),
            signed_money(account.difference).to_string(),
            account.record_date.to_string(),
            account.change_date.to_string(),
        ]);
    }
    println!("{}", accounts);

    Ok(())
}
