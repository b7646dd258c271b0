mod common;

use anyhow::Result;
use common::{INITIAL_BALANCE, log_lines, test_ledger};
use std::sync::Arc;
use teller::cli::{SessionSummary, run_session};
use teller::{Ledger, TransactionLog};

async fn run(ledger: &Arc<Ledger>, script: &str) -> Result<(SessionSummary, String)> {
    let mut output = Vec::new();
    let summary = run_session(Arc::clone(ledger), script.as_bytes(), &mut output).await?;
    Ok((summary, String::from_utf8(output)?))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_applies_requests() -> Result<()> {
    let (ledger, _temp) = test_ledger(5)?;

    let script = "\
# fund account 2
deposit 2 200
withdraw 0 1200
withdraw 1 $99.95
wait
balance 2
";
    let (summary, output) = run(&ledger, script).await?;

    assert!(output.contains("Deposited $200.00 into account 2"));
    assert!(output.contains("Withdrawal of $1200.00 from account 0 declined: insufficient funds"));
    assert!(output.contains("Withdrew $99.95 from account 1"));
    // `wait` ran every earlier request before the balance was read
    assert!(output.trim_end().ends_with("Account 2 Balance: $1200.00"));

    assert_eq!(
        summary,
        SessionSummary {
            completed: 4,
            declined: 1,
            rejected: 0,
            log_failures: 0,
        }
    );
    assert_eq!(ledger.balance(1)?, INITIAL_BALANCE - 9995);
    assert_eq!(log_lines(&ledger).len(), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_reports_bad_input_and_keeps_going() -> Result<()> {
    let (ledger, _temp) = test_ledger(5)?;

    let script = "\
deposit one 100
deposit 1 ten
withdraw 1 0
balance 5
fly 1 2
deposit 1 10
";
    let (summary, output) = run(&ledger, script).await?;

    assert!(output.contains("Invalid account number 'one'"));
    assert!(output.contains("Invalid amount 'ten'"));
    assert!(output.contains("Invalid amount: 0 cents"));
    assert!(output.contains("Account 5 does not exist"));
    assert!(output.contains("Unknown command 'fly'"));
    assert!(output.contains("Deposited $10.00 into account 1"));

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.rejected, 5);
    assert_eq!(ledger.balance(1)?, INITIAL_BALANCE + 1000);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exit_drains_pending_requests() -> Result<()> {
    let (ledger, _temp) = test_ledger(1)?;

    let mut script = "deposit 0 0.01\n".repeat(100);
    script.push_str("exit\ndeposit 0 5000\n");

    let (summary, _output) = run(&ledger, &script).await?;

    // Everything before `exit` ran, nothing after it did
    assert_eq!(summary.completed, 100);
    assert_eq!(ledger.balance(0)?, INITIAL_BALANCE + 100);
    assert_eq!(log_lines(&ledger).len(), 100);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_session_withdrawals_never_overdraw() -> Result<()> {
    let (ledger, _temp) = test_ledger(1)?;

    // 40 requests for $30.00 against $1000.00: exactly 33 can succeed
    let script = "withdraw 0 30\n".repeat(40);
    let (summary, output) = run(&ledger, &script).await?;

    assert_eq!(summary.completed, 40);
    assert_eq!(summary.declined, 7);
    assert_eq!(output.matches("Withdrew $30.00").count(), 33);
    assert_eq!(ledger.balance(0)?, 1000);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_counts_log_failures() -> Result<()> {
    let temp = tempfile::TempDir::new()?;
    let log = Arc::new(TransactionLog::new(temp.path()));
    let ledger = Arc::new(Ledger::new(2, INITIAL_BALANCE, log)?);

    let (summary, output) = run(&ledger, "deposit 0 1\nwithdraw 1 1\n").await?;

    // The transactions themselves still succeed
    assert!(output.contains("Deposited $1.00 into account 0"));
    assert!(output.contains("Withdrew $1.00 from account 1"));
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.log_failures, 2);

    Ok(())
}

#[tokio::test]
async fn test_balances_and_help() -> Result<()> {
    let (ledger, _temp) = test_ledger(3)?;

    let (_summary, output) = run(&ledger, "help\nbalances\n").await?;

    assert!(output.contains("deposit <account> <amount>"));
    assert!(output.contains("ACCOUNT"));
    assert_eq!(output.matches("1000.00").count(), 3);

    Ok(())
}
