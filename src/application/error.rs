use thiserror::Error;

use crate::domain::{AccountIndex, Cents};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid amount: {0} cents (must be positive)")]
    InvalidAmount(Cents),

    #[error("Account {index} does not exist (valid accounts: 0..{len})")]
    IndexOutOfRange { index: AccountIndex, len: usize },

    #[error("Deposit would overflow the balance of account {index}")]
    BalanceOverflow { index: AccountIndex },

    #[error("A ledger needs at least one account")]
    NoAccounts,

    #[error("Invalid initial balance: {0} cents (must not be negative)")]
    InvalidInitialBalance(Cents),
}
