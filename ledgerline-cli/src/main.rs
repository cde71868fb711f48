//! Ledgerline CLI - bank statements into your books

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config, export, import, parse, rebalance, reconcile, summary, validate};

/// Ledgerline - import and reconcile bank statement CSVs
#[derive(Parser)]
#[command(name = "ledgerline", version, about, long_about = None)]
struct Cli {
    /// Show debug logging (overrides LEDGERLINE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a CSV file can be imported
    Validate {
        /// Path to CSV file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a CSV file and show the transactions without storing them
    Parse {
        /// Path to CSV file
        file: PathBuf,
        /// Read ambiguous dates as day-first or month-first
        #[arg(long)]
        date_order: Option<String>,
        /// Maximum rows to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import transactions from a statement CSV
    Import {
        /// Path to CSV file
        file: PathBuf,
        /// Bank account the statement belongs to
        #[arg(long)]
        account: Option<String>,
        /// Balance before the first transaction (defaults to the latest stored balance)
        #[arg(long, allow_hyphen_values = true)]
        initial_balance: Option<Decimal>,
        /// Ending balance printed on the statement, to reconcile against
        #[arg(long, allow_hyphen_values = true)]
        ending_balance: Option<Decimal>,
        /// Look up vendors for new transactions
        #[arg(long)]
        enrich: bool,
        /// Preview without importing
        #[arg(long)]
        preview: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the latest stored balance with a statement's ending balance
    Reconcile {
        /// Ending balance printed on the statement
        #[arg(allow_hyphen_values = true)]
        ending_balance: Decimal,
        /// Bank account to reconcile
        #[arg(long)]
        account: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recompute stored running balances for an account
    Rebalance {
        /// Balance before the earliest transaction
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        initial_balance: Decimal,
        /// Bank account to rebalance
        #[arg(long)]
        account: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export stored transactions as CSV
    Export {
        /// Bank account to export
        #[arg(long)]
        account: Option<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show income, expense and balance sheet totals
    Summary {
        /// Bank account to summarize
        #[arg(long)]
        account: Option<String>,
        /// Count only verified transactions
        #[arg(long)]
        verified_only: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: Option<config::ConfigCommands>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("LEDGERLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Validate { file, json } => validate::run(&file, json),
        Commands::Parse { file, date_order, limit, json } => {
            parse::run(&file, date_order.as_deref(), limit, json)
        }
        Commands::Import { file, account, initial_balance, ending_balance, enrich, preview, json } => {
            let args = import::ImportArgs {
                file,
                account,
                initial_balance,
                ending_balance,
                enrich,
                preview,
            };
            import::run(args, json).await
        }
        Commands::Reconcile { ending_balance, account, json } => {
            reconcile::run(account.as_deref(), ending_balance, json).await
        }
        Commands::Rebalance { initial_balance, account, json } => {
            rebalance::run(account.as_deref(), initial_balance, json).await
        }
        Commands::Export { account, output } => export::run(account.as_deref(), output.as_deref()).await,
        Commands::Summary { account, verified_only, json } => {
            summary::run(account.as_deref(), verified_only, json).await
        }
        Commands::Config { command, json } => config::run(command, json),
    }
}
