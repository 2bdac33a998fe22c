//! Balance command - record account balances by hand

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use dialoguer::Input;
use rust_decimal::Decimal;

use super::get_context;
use crate::output::{self, money};

#[derive(Subcommand)]
pub enum BalanceCommands {
    /// Add a balance snapshot for an account
    Add {
        /// Account number
        account: String,
        /// Balance amount (prompted if not given)
        balance: Option<String>,
        /// Day of the balance (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Replace an existing snapshot for the same day
        #[arg(long = "override")]
        manual_override: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: BalanceCommands) -> Result<()> {
    match command {
        BalanceCommands::Add {
            account,
            balance,
            date,
            manual_override,
            json,
        } => add(account, balance, date, manual_override, json),
    }
}

fn add(
    account: String,
    balance: Option<String>,
    date: Option<NaiveDate>,
    manual_override: bool,
    json: bool,
) -> Result<()> {
    let balance_str = match balance {
        Some(b) => b,
        None => Input::new().with_prompt("Balance").interact_text()?,
    };
    let balance: Decimal = balance_str
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid balance: {}", balance_str))?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let ctx = get_context("balance add")?;
    let result = ctx
        .import_service
        .add_manual_balance(&account, balance, date, manual_override)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.recorded {
        output::warning(&format!(
            "A balance for {} on {} already exists; use --override to replace it",
            result.account_number, result.date
        ));
        return Ok(());
    }

    let verb = if result.replaced { "Replaced" } else { "Recorded" };
    output::success(&format!(
        "{} balance {} for {} on {}",
        verb,
        money(result.balance),
        result.account_number,
        result.date
    ));
    if result.stale {
        output::info("The account already holds a newer balance; only the history was updated");
    }

    Ok(())
}
