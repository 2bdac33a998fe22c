//! History command - balance history per account or in total

use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use kontobuch_core::services::DateFilter;

use super::get_context;
use crate::output::{create_table, money};

pub fn run(
    account: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let ctx = get_context("history")?;
    let filter = DateFilter { from, to };

    match account {
        Some(number) => {
            let snapshots = ctx.history_service.account_history(number, filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
                return Ok(());
            }

            if snapshots.is_empty() {
                println!("No balance snapshots for {}.", number);
                return Ok(());
            }

            println!("{}", format!("Balance history of {}", number).bold());
            let mut table = create_table();
            table.set_header(vec!["Date", "Balance", "Source", "Recorded"]);
            for snapshot in &snapshots {
                table.add_row(vec![
                    snapshot.record_date.to_string(),
                    money(snapshot.balance),
                    (if snapshot.manual { "manual" } else { "statement" }).to_string(),
                    snapshot.change_date.to_string(),
                ]);
            }
            println!("{}", table);
        }
        None => {
            let timeline = ctx.history_service.cash_timeline(filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&timeline)?);
                return Ok(());
            }

            if timeline.is_empty() {
                println!("No balance snapshots yet.");
                return Ok(());
            }

            println!("{}", "Total cash over time".bold());
            let mut table = create_table();
            table.set_header(vec!["Date", "Total"]);
            for point in &timeline {
                table.add_row(vec![point.date.to_string(), money(point.total)]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}
