use std::str::FromStr;
use thiserror::Error;

use crate::domain::{AccountIndex, Cents, ParseCentsError, parse_cents};

/// A call into the ledger, run off the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Deposit { account: AccountIndex, amount: Cents },
    Withdraw { account: AccountIndex, amount: Cents },
    Balance { account: AccountIndex },
    Balances,
}

/// One line of session input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Op(Operation),
    /// Block until every operation submitted so far has finished
    Wait,
    Help,
    Exit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands")]
    UnknownCommand(String),

    #[error("Missing {0}")]
    MissingArgument(&'static str),

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("Invalid account number '{0}'. Please enter a whole number")]
    InvalidAccount(String),

    #[error("Invalid amount '{input}': {source}")]
    InvalidAmount {
        input: String,
        source: ParseCentsError,
    },
}

pub const HELP: &str = "\
Commands:
  deposit <account> <amount>    add money to an account
  withdraw <account> <amount>   take money out of an account
  balance <account>             show one account's balance
  balances                      show every account's balance
  wait                          wait for pending requests to finish
  help                          show this message
  exit                          finish pending requests and quit";

impl Request {
    /// Parse a session line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Request>, RequestError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

impl FromStr for Request {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words
            .next()
            .ok_or(RequestError::MissingArgument("command"))?
            .to_lowercase();

        let request = match command.as_str() {
            "deposit" | "d" => Request::Op(Operation::Deposit {
                account: account_arg(words.next())?,
                amount: amount_arg(words.next())?,
            }),
            "withdraw" | "w" => Request::Op(Operation::Withdraw {
                account: account_arg(words.next())?,
                amount: amount_arg(words.next())?,
            }),
            "balance" | "b" => Request::Op(Operation::Balance {
                account: account_arg(words.next())?,
            }),
            "balances" => Request::Op(Operation::Balances),
            "wait" => Request::Wait,
            "help" | "?" => Request::Help,
            "exit" | "quit" => Request::Exit,
            _ => return Err(RequestError::UnknownCommand(command)),
        };

        if let Some(extra) = words.next() {
            return Err(RequestError::UnexpectedArgument(extra.to_string()));
        }
        Ok(request)
    }
}

fn account_arg(word: Option<&str>) -> Result<AccountIndex, RequestError> {
    let word = word.ok_or(RequestError::MissingArgument("account number"))?;
    word.parse()
        .map_err(|_| RequestError::InvalidAccount(word.to_string()))
}

fn amount_arg(word: Option<&str>) -> Result<Cents, RequestError> {
    let word = word.ok_or(RequestError::MissingArgument("amount"))?;
    // Accept "$200.00" as well as "200.00"
    let digits = word.strip_prefix('$').unwrap_or(word);
    parse_cents(digits).map_err(|source| RequestError::InvalidAmount {
        input: word.to_string(),
        source,
    })
}
