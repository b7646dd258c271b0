use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::{AccountIndex, Cents, ParseCentsError, format_cents, parse_cents};

/// Timestamp layout used in the transaction log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "Deposit",
            EntryKind::Withdrawal => "Withdrawal",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = ParseEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(EntryKind::Deposit),
            "Withdrawal" => Ok(EntryKind::Withdrawal),
            other => Err(ParseEntryError::UnknownKind(other.to_string())),
        }
    }
}

/// One committed deposit or withdrawal, as written to the transaction log.
///
/// The text form is a single line:
/// `2024-01-15 09:30:00 - Deposit: Account 2, Amount: $200.00`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub kind: EntryKind,
    pub account: AccountIndex,
    pub amount_cents: Cents,
}

impl LogEntry {
    pub fn new(
        timestamp: NaiveDateTime,
        kind: EntryKind,
        account: AccountIndex,
        amount_cents: Cents,
    ) -> Self {
        Self {
            timestamp,
            kind,
            account,
            amount_cents,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}: Account {}, Amount: ${}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind,
            self.account,
            format_cents(self.amount_cents)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseEntryError {
    #[error("missing '{0}' separator")]
    MissingSeparator(&'static str),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown entry kind: {0}")]
    UnknownKind(String),

    #[error("invalid account index: {0}")]
    InvalidAccount(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] ParseCentsError),
}

impl FromStr for LogEntry {
    type Err = ParseEntryError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (timestamp, rest) = line
            .split_once(" - ")
            .ok_or(ParseEntryError::MissingSeparator(" - "))?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| ParseEntryError::InvalidTimestamp(timestamp.to_string()))?;

        let (kind, rest) = rest
            .split_once(": Account ")
            .ok_or(ParseEntryError::MissingSeparator(": Account "))?;
        let kind: EntryKind = kind.parse()?;

        let (account, amount) = rest
            .split_once(", Amount: $")
            .ok_or(ParseEntryError::MissingSeparator(", Amount: $"))?;
        let account: AccountIndex = account
            .parse()
            .map_err(|_| ParseEntryError::InvalidAccount(account.to_string()))?;
        let amount_cents = parse_cents(amount)?;

        Ok(LogEntry::new(timestamp, kind, account, amount_cents))
    }
}
