use parking_lot::Mutex;
use thiserror::Error;

use super::Cents;

/// Position of an account inside a ledger, starting at 0.
pub type AccountIndex = usize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("amount must be positive, got {0} cents")]
    InvalidAmount(Cents),

    #[error("balance would overflow")]
    Overflow,
}

/// A single balance holder.
///
/// Every operation takes the account's own lock, so a withdrawal's
/// balance check and its subtraction form one critical section. Two
/// accounts never share a lock.
#[derive(Debug)]
pub struct Account {
    balance: Mutex<Cents>,
}

impl Account {
    pub fn new(initial_balance: Cents) -> Self {
        Self {
            balance: Mutex::new(initial_balance),
        }
    }

    pub fn balance(&self) -> Cents {
        *self.balance.lock()
    }

    /// Add `amount` to the balance.
    pub fn deposit(&self, amount: Cents) -> Result<(), AccountError> {
        ensure_positive(amount)?;

        let mut balance = self.balance.lock();
        *balance = balance.checked_add(amount).ok_or(AccountError::Overflow)?;
        Ok(())
    }

    /// Subtract `amount` if the balance covers it.
    /// Returns `Ok(false)` and leaves the balance untouched otherwise.
    pub fn withdraw(&self, amount: Cents) -> Result<bool, AccountError> {
        ensure_positive(amount)?;

        let mut balance = self.balance.lock();
        if *balance < amount {
            return Ok(false);
        }
        *balance -= amount;
        Ok(true)
    }
}

fn ensure_positive(amount: Cents) -> Result<(), AccountError> {
    if amount <= 0 {
        return Err(AccountError::InvalidAmount(amount));
    }
    Ok(())
}
