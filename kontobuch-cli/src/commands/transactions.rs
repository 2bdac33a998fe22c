//! Transactions command - list imported transactions

use anyhow::Result;

use super::get_context;
use crate::output::{create_table, signed_money};

pub fn run(account: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let ctx = get_context("transactions")?;
    let transactions = ctx.repository.get_transaction_views(account, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Date", "Account", "Amount", "Type", "Counterparty", "Purpose", "Category"]);
    for tx in &transactions {
        table.add_row(vec![
            tx.date.to_string(),
            tx.account_number.clone(),
            signed_money(tx.amount).to_string(),
            tx.transaction_type.clone(),
            tx.counterparty.clone(),
            tx.purpose.clone(),
            tx.category.clone(),
        ]);
    }
    println!("{}", table);

    if transactions.len() == limit {
        println!("Showing the newest {}; use --limit to see more.", limit);
    }

    Ok(())
}
