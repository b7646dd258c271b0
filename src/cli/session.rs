use anyhow::{Context, Result};
use log::warn;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::{JoinError, JoinSet};

use crate::application::{Ledger, LedgerError};
use crate::domain::{AccountIndex, Cents, format_cents};

use super::request::{HELP, Operation, Request};

/// Result of one operation, printed when its task finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deposited { account: AccountIndex, amount: Cents },
    Withdrew { account: AccountIndex, amount: Cents },
    Declined { account: AccountIndex, amount: Cents },
    Balance { account: AccountIndex, balance: Cents },
    Balances(Vec<Cents>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Deposited { account, amount } => write!(
                f,
                "Deposited ${} into account {}",
                format_cents(*amount),
                account
            ),
            Outcome::Withdrew { account, amount } => write!(
                f,
                "Withdrew ${} from account {}",
                format_cents(*amount),
                account
            ),
            Outcome::Declined { account, amount } => write!(
                f,
                "Withdrawal of ${} from account {} declined: insufficient funds",
                format_cents(*amount),
                account
            ),
            Outcome::Balance { account, balance } => {
                write!(f, "Account {} Balance: ${}", account, format_cents(*balance))
            }
            Outcome::Balances(balances) => {
                write!(f, "{:<10} {:>14}", "ACCOUNT", "BALANCE")?;
                for (account, balance) in balances.iter().enumerate() {
                    write!(f, "\n{:<10} {:>14}", account, format_cents(*balance))?;
                }
                Ok(())
            }
        }
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Operations the ledger carried out, declined withdrawals included
    pub completed: usize,
    /// Withdrawals refused for insufficient funds
    pub declined: usize,
    /// Lines that failed to parse, or operations the ledger rejected
    pub rejected: usize,
    /// Committed mutations missing from the transaction log
    pub log_failures: u64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed ({} declined), {} rejected, {} log write failure(s)",
            self.completed, self.declined, self.rejected, self.log_failures
        )
    }
}

/// Run the ledger against a stream of request lines.
///
/// Each operation is submitted to the blocking pool as soon as its line is
/// read, so operations run concurrently and their results are written in
/// completion order, not input order. `wait` and the end of input are the
/// join points: nothing after them runs until every earlier operation is done.
pub async fn run_session<R, W>(
    ledger: Arc<Ledger>,
    input: R,
    mut output: W,
) -> Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut pending: JoinSet<Result<Outcome, LedgerError>> = JoinSet::new();
    let mut summary = SessionSummary::default();

    loop {
        tokio::select! {
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                report(&mut output, joined, &mut summary).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read session input")? else {
                    break;
                };

                match Request::parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(Request::Op(operation))) => {
                        let ledger = Arc::clone(&ledger);
                        pending.spawn_blocking(move || execute(&ledger, operation));
                    }
                    Ok(Some(Request::Wait)) => {
                        drain(&mut pending, &mut output, &mut summary).await?;
                    }
                    Ok(Some(Request::Help)) => emit(&mut output, HELP).await?,
                    Ok(Some(Request::Exit)) => break,
                    Err(err) => {
                        summary.rejected += 1;
                        emit(&mut output, format!("Error: {}", err)).await?;
                    }
                }
            }
        }
    }

    drain(&mut pending, &mut output, &mut summary).await?;
    summary.log_failures = ledger.log_failures();
    output.flush().await?;

    Ok(summary)
}

/// Carry out one operation against the ledger.
pub fn execute(ledger: &Ledger, operation: Operation) -> Result<Outcome, LedgerError> {
    match operation {
        Operation::Deposit { account, amount } => {
            ledger.deposit(account, amount)?;
            Ok(Outcome::Deposited { account, amount })
        }
        Operation::Withdraw { account, amount } => {
            if ledger.withdraw(account, amount)? {
                Ok(Outcome::Withdrew { account, amount })
            } else {
                Ok(Outcome::Declined { account, amount })
            }
        }
        Operation::Balance { account } => Ok(Outcome::Balance {
            account,
            balance: ledger.balance(account)?,
        }),
        Operation::Balances => Ok(Outcome::Balances(ledger.balances())),
    }
}

async fn drain<W: AsyncWrite + Unpin>(
    pending: &mut JoinSet<Result<Outcome, LedgerError>>,
    output: &mut W,
    summary: &mut SessionSummary,
) -> Result<()> {
    while let Some(joined) = pending.join_next().await {
        report(output, joined, summary).await?;
    }
    Ok(())
}

async fn report<W: AsyncWrite + Unpin>(
    output: &mut W,
    joined: Result<Result<Outcome, LedgerError>, JoinError>,
    summary: &mut SessionSummary,
) -> Result<()> {
    match joined {
        Ok(Ok(outcome)) => {
            summary.completed += 1;
            if matches!(outcome, Outcome::Declined { .. }) {
                summary.declined += 1;
            }
            emit(output, &outcome).await?;
        }
        Ok(Err(err)) => {
            summary.rejected += 1;
            warn!("request rejected: {}", err);
            emit(output, format!("Error: {}", err)).await?;
        }
        Err(err) => {
            summary.rejected += 1;
            warn!("request task failed: {}", err);
            emit(output, format!("Error: request did not finish: {}", err)).await?;
        }
    }
    Ok(())
}

/// Write one line of session output.
async fn emit<W: AsyncWrite + Unpin>(output: &mut W, line: impl fmt::Display) -> Result<()> {
    output.write_all(format!("{}\n", line).as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
