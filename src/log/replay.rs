//! Log Replay
//!
//! Rebuilds current state by replaying the log, and repairs a torn tail
//! left by a crash mid-append.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::RecoveryMode;
use crate::error::{LedgerError, Result};

use super::{LogEntry, LogReader, RECORD_TERMINATOR};

/// Replays a log under a corrupt-record policy
#[derive(Debug, Clone, Copy)]
pub struct LogReplay {
    recovery_mode: RecoveryMode,
}

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayResult {
    /// Number of records applied, in log order
    pub records_applied: u64,

    /// Number of malformed records skipped
    pub records_skipped: u64,

    /// Distinct live keys after the last record
    pub live_keys: usize,
}

/// What `repair_tail` found at the end of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailRepair {
    /// Log is empty or ends with a terminator
    Clean,

    /// Final record was complete but unterminated; a terminator was added
    Terminated,

    /// Final record was partial and has been cut off
    Truncated { bytes: u64 },
}

impl LogReplay {
    pub fn new(recovery_mode: RecoveryMode) -> Self {
        Self { recovery_mode }
    }

    /// Visit every record in log order
    ///
    /// Malformed records are skipped (and counted) or fail the replay,
    /// depending on the recovery mode. `live_keys` is left at zero.
    pub fn for_each<F>(&self, path: &Path, mut visit: F) -> Result<ReplayResult>
    where
        F: FnMut(LogEntry),
    {
        let mut result = ReplayResult::default();

        for record in LogReader::open(path)? {
            match record {
                Ok(entry) => {
                    visit(entry);
                    result.records_applied += 1;
                }
                Err(LedgerError::Corruption { line, reason })
                    if self.recovery_mode == RecoveryMode::SkipCorrupt =>
                {
                    tracing::warn!(path = %path.display(), line, %reason, "skipping corrupt log record");
                    result.records_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    /// Replay the whole log into its canonical key → value state
    pub fn replay(&self, path: &Path) -> Result<(HashMap<String, String>, ReplayResult)> {
        let mut state = HashMap::new();
        let mut result = self.for_each(path, |entry| apply(&mut state, entry))?;
        result.live_keys = state.len();
        Ok((state, result))
    }

    /// Make sure the log ends on a record boundary
    ///
    /// A complete but unterminated final record gets its terminator. A tail
    /// that is not even well-formed JSON is a partial append and is truncated
    /// so the next append starts on a fresh line. A tail that parses but
    /// fails its checksum (or does not fit the record schema) is corruption:
    /// under [`RecoveryMode::Strict`] it fails with
    /// [`LedgerError::Corruption`] and the file is left untouched, otherwise
    /// it is only terminated and later skipped by replay.
    ///
    /// Creates the file if it does not exist.
    pub fn repair_tail(&self, path: &Path) -> Result<TailRepair> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(TailRepair::Clean);
        }

        let tail_start = match last_terminator(&mut file, len)? {
            Some(pos) if pos + 1 == len => return Ok(TailRepair::Clean),
            Some(pos) => pos + 1,
            None => 0,
        };

        let mut tail = Vec::with_capacity((len - tail_start) as usize);
        file.seek(SeekFrom::Start(tail_start))?;
        file.read_to_end(&mut tail)?;

        let repair = match LogEntry::decode(&tail) {
            Err(e) if e.is_partial() => {
                file.set_len(tail_start)?;
                TailRepair::Truncated {
                    bytes: len - tail_start,
                }
            }
            Err(e) if self.recovery_mode == RecoveryMode::Strict => {
                return Err(LedgerError::Corruption {
                    line: count_terminators(&mut file, tail_start)? + 1,
                    reason: e.to_string(),
                });
            }
            _ => {
                file.seek(SeekFrom::End(0))?;
                file.write_all(&[RECORD_TERMINATOR])?;
                TailRepair::Terminated
            }
        };
        file.sync_all()?;

        tracing::warn!(path = %path.display(), ?repair, "repaired torn log tail");
        Ok(repair)
    }
}

/// Apply one record to a working state
pub(crate) fn apply(state: &mut HashMap<String, String>, entry: LogEntry) {
    match entry {
        LogEntry::Put { key, value } => {
            state.insert(key, value);
        }
        LogEntry::Tombstone { key } => {
            state.remove(&key);
        }
    }
}

/// Offset of the last terminator byte in the file, scanning backwards
fn last_terminator(file: &mut File, len: u64) -> Result<Option<u64>> {
    let mut buf = [0u8; 4096];
    let mut end = len;

    while end > 0 {
        let start = end.saturating_sub(buf.len() as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;

        if let Some(pos) = chunk.iter().rposition(|&b| b == RECORD_TERMINATOR) {
            return Ok(Some(start + pos as u64));
        }
        end = start;
    }

    Ok(None)
}

/// Number of terminator bytes in the first `end` bytes of the file
fn count_terminators(file: &mut File, end: u64) -> Result<u64> {
    let mut buf = [0u8; 4096];
    let mut count = 0;
    let mut remaining = end;

    file.seek(SeekFrom::Start(0))?;
    while remaining > 0 {
        let chunk = &mut buf[..remaining.min(4096) as usize];
        file.read_exact(chunk)?;
        count += chunk.iter().filter(|&&b| b == RECORD_TERMINATOR).count() as u64;
        remaining -= chunk.len() as u64;
    }

    Ok(count)
}
