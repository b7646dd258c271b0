use chrono::{Local, SubsecRound};
use log::{trace, warn};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{AccountIndex, Cents, EntryKind, LogEntry, ParseEntryError};

/// How far back from the end of the file to look for the last complete line.
const TAIL_WINDOW: u64 = 4096;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to open transaction log {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to write transaction log {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to read transaction log {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Malformed transaction log line {line}: {source}")]
    Malformed {
        line: usize,
        source: ParseEntryError,
    },
}

/// Append-only transaction log backed by a plain text file.
///
/// All access goes through one gate, so at most one writer performs the
/// open-format-write-close sequence at a time and lines never interleave.
/// The file is opened for every append and closed right after.
pub struct TransactionLog {
    path: PathBuf,
    gate: Mutex<()>,
}

impl TransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp and append one entry.
    ///
    /// The timestamp is taken after the gate is acquired, so file order and
    /// timestamp order agree.
    pub fn append(
        &self,
        kind: EntryKind,
        account: AccountIndex,
        amount_cents: Cents,
    ) -> Result<LogEntry, LogError> {
        let _guard = self.gate.lock();

        let timestamp = Local::now().naive_local().trunc_subsecs(0);
        let entry = LogEntry::new(timestamp, kind, account, amount_cents);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Open {
                path: self.path.clone(),
                source,
            })?;

        let write_error = |source| LogError::Write {
            path: self.path.clone(),
            source,
        };

        let line_start = discard_torn_tail(&mut file).map_err(write_error)?;

        // One write call per line
        let line = format!("{}\n", entry);
        if let Err(source) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            // Drop whatever part of the line made it to disk
            if let Err(err) = file.set_len(line_start) {
                warn!("could not roll back partial line in {}: {}", self.path.display(), err);
            }
            return Err(write_error(source));
        }

        trace!("appended to {}: {}", self.path.display(), entry);
        Ok(entry)
    }

    /// Read back every entry in file order.
    /// A log that has never been written to is empty.
    pub fn entries(&self) -> Result<Vec<LogEntry>, LogError> {
        let _guard = self.gate.lock();

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LogError::Open {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| LogError::Read {
                path: self.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = line.parse().map_err(|source| LogError::Malformed {
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }
}

/// Cut off a trailing line that has no newline, left behind by an interrupted
/// write, so the next entry starts on a line of its own. Returns the file
/// length after the cut.
fn discard_torn_tail(file: &mut File) -> io::Result<u64> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }

    let window = len.min(TAIL_WINDOW);
    let window_start = len - window;
    file.seek(SeekFrom::Start(window_start))?;
    let mut tail = vec![0; window as usize];
    file.read_exact(&mut tail)?;

    if tail.last() == Some(&b'\n') {
        return Ok(len);
    }

    match tail.iter().rposition(|&b| b == b'\n') {
        Some(newline) => {
            let cut = window_start + newline as u64 + 1;
            file.set_len(cut)?;
            Ok(cut)
        }
        None if window_start == 0 => {
            file.set_len(0)?;
            Ok(0)
        }
        // No line boundary in reach: terminate the fragment instead
        None => {
            file.write_all(b"\n")?;
            Ok(len + 1)
        }
    }
}
