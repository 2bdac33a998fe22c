//! Kontobuch CLI - MT940 bank statements in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{balance, history, import, logs, status, transactions};

/// Kontobuch - MT940 bank statements in your terminal
#[derive(Parser)]
#[command(name = "kb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show accounts and ledger summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import an MT940 statement file
    Import {
        /// Path to the statement file
        file: PathBuf,
        /// Parse and show the transactions without importing
        #[arg(long)]
        preview: bool,
        /// Commit each statement on its own instead of the whole file at once
        #[arg(long)]
        non_atomic: bool,
        /// Never ask for names of new accounts
        #[arg(long)]
        no_prompt: bool,
        /// Category for the imported transactions
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show balance history of an account, or total cash over time
    History {
        /// Account number (all accounts if not specified)
        account: Option<String>,
        /// First day to show (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to show (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List imported transactions, newest first
    Transactions {
        /// Account number (all accounts if not specified)
        account: Option<String>,
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record balances by hand
    Balance {
        #[command(subcommand)]
        command: balance::BalanceCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by RUST_LOG
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Status { json } => status::run(json),
        Commands::Import {
            file,
            preview,
            non_atomic,
            no_prompt,
            category,
            json,
        } => import::run(import::ImportArgs {
            file,
            preview,
            non_atomic,
            no_prompt,
            category,
            json,
        }),
        Commands::History {
            account,
            from,
            to,
            json,
        } => history::run(account.as_deref(), from, to, json),
        Commands::Transactions {
            account,
            limit,
            json,
        } => transactions::run(account.as_deref(), limit, json),
        Commands::Balance { command } => balance::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
