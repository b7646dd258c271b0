// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use teller::{Cents, Ledger, LedgerConfig};
use tempfile::TempDir;

/// $1000.00, the balance every test account starts with
pub const INITIAL_BALANCE: Cents = 100_000;

/// Helper to create a test ledger whose log lives in a temporary directory
pub fn test_ledger(accounts: usize) -> Result<(Arc<Ledger>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = LedgerConfig::default()
        .with_accounts(accounts)
        .with_initial_balance(INITIAL_BALANCE)
        .with_log_path(temp_dir.path().join("transaction_log.txt"));
    let ledger = Ledger::from_config(&config)?;
    Ok((Arc::new(ledger), temp_dir))
}

/// Path of the log file backing a test ledger
pub fn log_path(ledger: &Ledger) -> PathBuf {
    ledger.transaction_log().path().to_path_buf()
}

/// Raw lines of the transaction log, empty if it was never written
pub fn log_lines(ledger: &Ledger) -> Vec<String> {
    fs::read_to_string(log_path(ledger))
        .map(|contents| contents.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
