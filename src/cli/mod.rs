use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write, stderr, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;

use crate::application::Ledger;
use crate::config::{DEFAULT_ACCOUNTS, DEFAULT_LOG_FILE, LedgerConfig};
use crate::domain::{AccountIndex, LogEntry, format_cents, parse_cents};
use crate::io::Exporter;

pub mod request;
pub mod session;

pub use request::{Operation, Request, RequestError};
pub use session::{Outcome, SessionSummary, run_session};

/// Teller - concurrent bank ledger
#[derive(Parser)]
#[command(name = "teller")]
#[command(about = "A small concurrent bank ledger with an append-only transaction log")]
#[command(version)]
pub struct Cli {
    /// Transaction log file path
    #[arg(short, long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Number of accounts (numbered from 0)
    #[arg(short, long, global = true, default_value_t = DEFAULT_ACCOUNTS)]
    pub accounts: usize,

    /// Starting balance of every account (e.g., "1000.00" or "1000")
    #[arg(short, long, global = true, default_value = "1000.00")]
    pub initial_balance: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read deposit/withdraw/balance requests from stdin (the default)
    Session,

    /// Show entries from the transaction log
    History {
        /// Only show entries for this account
        #[arg(long)]
        account: Option<AccountIndex>,

        /// Maximum number of entries to show (most recent)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Export the transaction log to CSV or JSON
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    /// Ledger configuration from the global options.
    pub fn config(&self) -> Result<LedgerConfig> {
        let initial_balance = parse_cents(&self.initial_balance)
            .context("Invalid initial balance. Use '1000.00' or '1000'")?;

        Ok(LedgerConfig::default()
            .with_accounts(self.accounts)
            .with_initial_balance(initial_balance)
            .with_log_path(&self.log_file))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config()?;
        let ledger = Arc::new(Ledger::from_config(&config)?);

        match self.command.unwrap_or(Commands::Session) {
            Commands::Session => run_session_command(ledger, self.verbose).await?,

            Commands::History { account, limit } => {
                run_history_command(&ledger, account, limit, stdout())?;
            }

            Commands::Export { format, output } => {
                run_export_command(&ledger, format, output, stdout())?;
            }
        }

        Ok(())
    }
}

async fn run_session_command(ledger: Arc<Ledger>, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!(
            "{} accounts (0..{}), log file {}. Type 'help' for commands.",
            ledger.len(),
            ledger.len(),
            ledger.transaction_log().path().display()
        );
    }

    let input = BufReader::new(tokio::io::stdin());
    let summary = run_session(Arc::clone(&ledger), input, tokio::io::stdout()).await?;

    write_session_report(stderr(), &summary, ledger.transaction_log().path())
}

/// Closing report of a session, written to stderr so it never mixes with the
/// request results on stdout.
fn write_session_report<W: Write>(
    mut out: W,
    summary: &SessionSummary,
    log_path: &Path,
) -> Result<()> {
    if summary.log_failures > 0 {
        writeln!(
            out,
            "Warning: {} transaction(s) could not be written to {}",
            summary.log_failures,
            log_path.display()
        )?;
    }
    writeln!(out, "Session finished: {}", summary)?;
    Ok(())
}

/// Entries shown by `history`: those of `account` (all when `None`), keeping
/// only the most recent `limit`.
pub fn select_history(
    mut entries: Vec<LogEntry>,
    account: Option<AccountIndex>,
    limit: Option<usize>,
) -> Vec<LogEntry> {
    if let Some(account) = account {
        entries.retain(|entry| entry.account == account);
    }
    if let Some(limit) = limit {
        let skip = entries.len().saturating_sub(limit);
        entries = entries.split_off(skip);
    }
    entries
}

fn run_history_command<W: Write>(
    ledger: &Ledger,
    account: Option<AccountIndex>,
    limit: Option<usize>,
    mut out: W,
) -> Result<()> {
    let entries = ledger
        .transaction_log()
        .entries()
        .context("Failed to read transaction log")?;
    let entries = select_history(entries, account, limit);

    if entries.is_empty() {
        writeln!(out, "No transactions found.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<20} {:<12} {:>8} {:>14}",
        "TIMESTAMP", "KIND", "ACCOUNT", "AMOUNT"
    )?;
    writeln!(out, "{}", "-".repeat(57))?;
    for entry in &entries {
        writeln!(
            out,
            "{:<20} {:<12} {:>8} {:>14}",
            entry.timestamp.to_string(),
            entry.kind.as_str(),
            entry.account,
            format_cents(entry.amount_cents)
        )?;
    }
    writeln!(out, "\nTotal: {} transaction(s)", entries.len())?;

    Ok(())
}

/// Export to `output`, or to `console` when no file is given.
fn run_export_command<W: Write>(
    ledger: &Ledger,
    format: ExportFormat,
    output: Option<PathBuf>,
    console: W,
) -> Result<usize> {
    let exporter = Exporter::new(ledger);

    let writer: Box<dyn Write + '_> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file {}", path.display())
        })?)),
        None => Box::new(console),
    };

    let count = match format {
        ExportFormat::Csv => exporter.export_entries_csv(writer)?,
        ExportFormat::Json => exporter.export_entries_json(writer)?.entries.len(),
    };

    if let Some(path) = output {
        eprintln!("Exported {} transaction(s) to {}", count, path.display());
    }

    Ok(count)
}
