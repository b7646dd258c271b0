use std::path::PathBuf;

use crate::domain::Cents;

pub const DEFAULT_LOG_FILE: &str = "transaction_log.txt";
pub const DEFAULT_ACCOUNTS: usize = 5;
/// $1000.00
pub const DEFAULT_INITIAL_BALANCE: Cents = 100_000;

/// Startup parameters for a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Number of accounts, indexed from 0.
    pub accounts: usize,
    /// Balance every account starts with, in cents.
    pub initial_balance: Cents,
    /// Transaction log file, opened in append mode for every write.
    pub log_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            accounts: DEFAULT_ACCOUNTS,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LedgerConfig {
    pub fn with_accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_initial_balance(mut self, initial_balance: Cents) -> Self {
        self.initial_balance = initial_balance;
        self
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = log_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.accounts, 5);
        assert_eq!(config.initial_balance, 100000);
        assert_eq!(config.log_path, PathBuf::from("transaction_log.txt"));
    }

    #[test]
    fn test_builders_override_defaults() {
        let config = LedgerConfig::default()
            .with_accounts(2)
            .with_initial_balance(0)
            .with_log_path("/tmp/ledger.log");
        assert_eq!(config.accounts, 2);
        assert_eq!(config.initial_balance, 0);
        assert_eq!(config.log_path, PathBuf::from("/tmp/ledger.log"));
    }
}
