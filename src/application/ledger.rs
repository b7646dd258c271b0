use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::LedgerConfig;
use crate::domain::{Account, AccountError, AccountIndex, Cents, EntryKind};
use crate::storage::TransactionLog;

use super::LedgerError;

/// A fixed set of accounts plus the log their mutations are recorded in.
///
/// This is the primary interface for any caller. All operations take `&self`
/// and may be called from any thread; share the ledger through an `Arc`.
pub struct Ledger {
    accounts: Vec<Account>,
    log: Arc<TransactionLog>,
    log_failures: AtomicU64,
}

impl Ledger {
    /// Create `count` accounts, each holding `initial_balance`.
    pub fn new(
        count: usize,
        initial_balance: Cents,
        log: Arc<TransactionLog>,
    ) -> Result<Self, LedgerError> {
        if count == 0 {
            return Err(LedgerError::NoAccounts);
        }
        if initial_balance < 0 {
            return Err(LedgerError::InvalidInitialBalance(initial_balance));
        }

        let accounts = (0..count).map(|_| Account::new(initial_balance)).collect();
        info!(
            "ledger ready: {} accounts, initial balance {} cents, log {}",
            count,
            initial_balance,
            log.path().display()
        );

        Ok(Self {
            accounts,
            log,
            log_failures: AtomicU64::new(0),
        })
    }

    /// Build a ledger and its transaction log from configuration.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let log = Arc::new(TransactionLog::new(&config.log_path));
        Self::new(config.accounts, config.initial_balance, log)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Always false: a ledger is never built without accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn transaction_log(&self) -> &TransactionLog {
        &self.log
    }

    /// Number of committed mutations whose log line could not be written.
    pub fn log_failures(&self) -> u64 {
        self.log_failures.load(Ordering::Relaxed)
    }

    pub fn balance(&self, index: AccountIndex) -> Result<Cents, LedgerError> {
        Ok(self.account(index)?.balance())
    }

    /// Balance of every account, in index order.
    /// Each read is atomic on its own; the list is not a consistent snapshot
    /// across accounts.
    pub fn balances(&self) -> Vec<Cents> {
        self.accounts.iter().map(Account::balance).collect()
    }

    pub fn deposit(&self, index: AccountIndex, amount: Cents) -> Result<(), LedgerError> {
        let account = self.account(index)?;
        account
            .deposit(amount)
            .map_err(|err| account_error(err, index))?;

        debug!("deposited {} cents into account {}", amount, index);
        self.record(EntryKind::Deposit, index, amount);
        Ok(())
    }

    /// Withdraw `amount` from an account.
    ///
    /// Returns `Ok(false)` when the balance does not cover the amount; nothing
    /// is changed or logged in that case.
    pub fn withdraw(&self, index: AccountIndex, amount: Cents) -> Result<bool, LedgerError> {
        let account = self.account(index)?;
        let withdrawn = account
            .withdraw(amount)
            .map_err(|err| account_error(err, index))?;

        if !withdrawn {
            debug!(
                "declined withdrawal of {} cents from account {}: insufficient funds",
                amount, index
            );
            return Ok(false);
        }

        debug!("withdrew {} cents from account {}", amount, index);
        self.record(EntryKind::Withdrawal, index, amount);
        Ok(true)
    }

    fn account(&self, index: AccountIndex) -> Result<&Account, LedgerError> {
        self.accounts
            .get(index)
            .ok_or(LedgerError::IndexOutOfRange {
                index,
                len: self.accounts.len(),
            })
    }

    // The mutation is already committed; a failed write is reported, not undone.
    fn record(&self, kind: EntryKind, index: AccountIndex, amount: Cents) {
        if let Err(err) = self.log.append(kind, index, amount) {
            self.log_failures.fetch_add(1, Ordering::Relaxed);
            error!("{} on account {} was not logged: {}", kind, index, err);
        }
    }
}

fn account_error(err: AccountError, index: AccountIndex) -> LedgerError {
    match err {
        AccountError::InvalidAmount(amount) => LedgerError::InvalidAmount(amount),
        AccountError::Overflow => LedgerError::BalanceOverflow { index },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogEntry;
    use tempfile::TempDir;

    fn ledger(count: usize, initial: Cents) -> (Ledger, TempDir) {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(TransactionLog::new(dir.path().join("log.txt")));
        (Ledger::new(count, initial, log).unwrap(), dir)
    }

    fn logged(ledger: &Ledger) -> Vec<LogEntry> {
        ledger.transaction_log().entries().unwrap()
    }

    #[test]
    fn test_new_seeds_every_account() {
        let (ledger, _dir) = ledger(5, 100000);
        assert_eq!(ledger.len(), 5);
        assert!(!ledger.is_empty());
        assert_eq!(ledger.balances(), vec![100000; 5]);
    }

    #[test]
    fn test_new_rejects_bad_configuration() {
        let log = Arc::new(TransactionLog::new("unused.txt"));
        assert!(matches!(
            Ledger::new(0, 100, log.clone()),
            Err(LedgerError::NoAccounts)
        ));
        assert!(matches!(
            Ledger::new(3, -1, log),
            Err(LedgerError::InvalidInitialBalance(-1))
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let (ledger, _dir) = ledger(5, 100000);
        let expected = LedgerError::IndexOutOfRange { index: 5, len: 5 };

        assert_eq!(ledger.balance(5), Err(expected.clone()));
        assert_eq!(ledger.deposit(5, 100), Err(expected.clone()));
        assert_eq!(ledger.withdraw(5, 100), Err(expected));
        assert!(logged(&ledger).is_empty());
    }

    #[test]
    fn test_index_is_checked_before_amount() {
        let (ledger, _dir) = ledger(2, 0);
        assert_eq!(
            ledger.deposit(9, -5),
            Err(LedgerError::IndexOutOfRange { index: 9, len: 2 })
        );
    }

    #[test]
    fn test_invalid_amount_changes_nothing() {
        let (ledger, _dir) = ledger(3, 100000);

        assert_eq!(ledger.deposit(1, 0), Err(LedgerError::InvalidAmount(0)));
        assert_eq!(
            ledger.withdraw(1, -500),
            Err(LedgerError::InvalidAmount(-500))
        );
        assert_eq!(ledger.balance(1), Ok(100000));
        assert!(logged(&ledger).is_empty());
    }

    #[test]
    fn test_deposit_is_logged() {
        let (ledger, _dir) = ledger(5, 100000);

        ledger.deposit(2, 20000).unwrap();

        assert_eq!(ledger.balance(2), Ok(120000));
        let entries = logged(&ledger);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Deposit);
        assert_eq!(entries[0].account, 2);
        assert_eq!(entries[0].amount_cents, 20000);
    }

    #[test]
    fn test_declined_withdrawal_is_not_logged() {
        let (ledger, _dir) = ledger(1, 100000);

        assert_eq!(ledger.withdraw(0, 120000), Ok(false));
        assert_eq!(ledger.balance(0), Ok(100000));
        assert!(logged(&ledger).is_empty());

        assert_eq!(ledger.withdraw(0, 50000), Ok(true));
        assert_eq!(ledger.balance(0), Ok(50000));
        let entries = logged(&ledger);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Withdrawal);
    }

    #[test]
    fn test_overflow_is_reported_with_account() {
        let (ledger, _dir) = ledger(2, i64::MAX);
        assert_eq!(
            ledger.deposit(1, 1),
            Err(LedgerError::BalanceOverflow { index: 1 })
        );
        assert!(logged(&ledger).is_empty());
    }

    #[test]
    fn test_log_failure_keeps_the_mutation() {
        let dir = TempDir::new().unwrap();
        // Appending to a directory always fails
        let log = Arc::new(TransactionLog::new(dir.path()));
        let ledger = Ledger::new(1, 1000, log).unwrap();

        assert_eq!(ledger.deposit(0, 500), Ok(()));
        assert_eq!(ledger.withdraw(0, 200), Ok(true));

        assert_eq!(ledger.balance(0), Ok(1300));
        assert_eq!(ledger.log_failures(), 2);
    }
}
