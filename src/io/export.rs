use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::Ledger;
use crate::domain::{LogEntry, format_cents};

/// Transaction log snapshot for JSON export
#[derive(Debug, Clone, Serialize)]
pub struct LogSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub entries: Vec<LogEntry>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    ledger: &'a Ledger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Export transaction log entries to CSV format
    pub fn export_entries_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.ledger.transaction_log().entries()?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["timestamp", "kind", "account", "amount_cents"])?;

        for entry in &entries {
            csv_writer.write_record(&[
                entry.timestamp.to_string(),
                entry.kind.to_string(),
                entry.account.to_string(),
                entry.amount_cents.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }

    /// Export transaction log entries as a JSON snapshot
    pub fn export_entries_json<W: Write>(&self, mut writer: W) -> Result<LogSnapshot> {
        let snapshot = LogSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            entries: self.ledger.transaction_log().entries()?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }

    /// Export current balances to CSV format
    pub fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.ledger.balances();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account", "balance_cents", "balance"])?;

        for (account, balance) in balances.iter().enumerate() {
            csv_writer.write_record(&[
                account.to_string(),
                balance.to_string(),
                format_cents(*balance),
            ])?;
        }

        csv_writer.flush()?;
        Ok(balances.len())
    }
}
