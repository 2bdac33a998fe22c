//! Import command - import an MT940 statement file

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use dialoguer::Input;
use kontobuch_core::{AccountNamer, HeadlessNamer, ImportSummary, ParsedTransaction};

use super::get_context;
use crate::output::{self, create_table, money, signed_money};

/// Rows shown in preview mode before truncating
const PREVIEW_ROWS: usize = 20;

pub struct ImportArgs {
    pub file: PathBuf,
    pub preview: bool,
    pub non_atomic: bool,
    pub no_prompt: bool,
    pub category: Option<String>,
    pub json: bool,
}

/// Asks on the terminal for the name of an unknown account
struct PromptNamer;

impl AccountNamer for PromptNamer {
    fn prompt_for_account_name(&self, suggested_number: &str) -> Option<String> {
        let answer: String = Input::new()
            .with_prompt(format!("Name for new account {}", suggested_number))
            .allow_empty(true)
            .interact_text()
            .ok()?;
        let answer = answer.trim();
        (!answer.is_empty()).then(|| answer.to_string())
    }
}

pub fn run(args: ImportArgs) -> Result<()> {
    let ctx = get_context("import")?;

    if args.preview {
        let parsed = ctx.import_service.preview(&args.file)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        } else {
            print_preview(&parsed);
        }
        return Ok(());
    }

    let mut options = ctx.import_options();
    if args.non_atomic {
        options.atomic = false;
    }
    if let Some(category) = args.category {
        options.category = category;
    }

    let interactive = !args.no_prompt
        && !args.json
        && ctx.config.interactive_naming()
        && atty::is(atty::Stream::Stdin);
    let namer: &dyn AccountNamer = if interactive { &PromptNamer } else { &HeadlessNamer };

    match ctx.import_service.import_file(&args.file, namer, &options) {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::success("Import complete");
                println!();
                print_summary(&summary);
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "error": err.source.to_string(),
                        "atomic": options.atomic,
                        "summary": err.summary,
                    })
                );
            } else if err.summary.rows_written() > 0 {
                output::warning("Import stopped; rows written before the failure were kept:");
                println!();
                print_summary(&err.summary);
                println!();
            } else if options.atomic {
                output::warning("Import rolled back, nothing was written");
            }
            Err(err.source.into())
        }
    }
}

fn print_preview(parsed: &[ParsedTransaction]) {
    println!("{}", "PREVIEW MODE - No changes applied".yellow());
    println!();

    let mut table = create_table();
    table.set_header(vec!["Account", "Date", "Amount", "Type", "Counterparty", "Purpose"]);

    for tx in parsed.iter().take(PREVIEW_ROWS) {
        table.add_row(vec![
            tx.account.clone(),
            tx.date.to_string(),
            signed_money(tx.amount).to_string(),
            tx.transaction_type_name.clone(),
            tx.counterparty_name
                .clone()
                .or_else(|| tx.counterparty_account.clone())
                .unwrap_or_else(|| "-".to_string()),
            tx.purpose.clone(),
        ]);
    }

    println!("{}", table);

    if parsed.len() > PREVIEW_ROWS {
        println!("... and {} more", parsed.len() - PREVIEW_ROWS);
    }

    let closing: Vec<_> = parsed.iter().filter_map(|tx| tx.closing_balance.as_ref()).collect();
    if !closing.is_empty() {
        println!();
        println!("{}", "Closing balances".bold());
        for balance in closing {
            println!(
                "  {} {} {}",
                balance.account,
                balance.date,
                money(balance.balance)
            );
        }
    }

    println!();
    println!("  Parsed: {}", parsed.len());
}

fn print_summary(summary: &ImportSummary) {
    println!("  Parsed: {}", summary.transactions_parsed);
    println!("  Imported: {}", summary.transactions_inserted);
    println!("  Skipped (already imported): {}", summary.transactions_duplicate);
    if summary.accounts_created > 0 {
        println!("  New accounts: {}", summary.accounts_created);
    }
    if summary.counterparties_created > 0 {
        println!("  New counterparties: {}", summary.counterparties_created);
    }
    if summary.transaction_types_created > 0 {
        println!("  New transaction types: {}", summary.transaction_types_created);
    }
    println!(
        "  Balance snapshots: {} new, {} replaced, {} existing",
        summary.snapshots_inserted, summary.snapshots_replaced, summary.snapshots_existing
    );
    println!("  Accounts updated: {}", summary.accounts_updated);
    if summary.updates_stale > 0 {
        println!(
            "  {}",
            format!(
                "Closing balances older than the stored balance: {}",
                summary.updates_stale
            )
            .yellow()
        );
    }
}
