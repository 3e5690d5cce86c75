//! Scanner Module
//!
//! Answers reads straight from the log when there is no memory index,
//! and evaluates predicate searches over either source.
//!
//! Every log scan here reads the file from the start. The store holds at
//! least its shared lock for the full duration of a scan, so no append or
//! compaction can land in the middle of one.

use std::collections::HashMap;
use std::path::Path;

use crate::config::RecoveryMode;
use crate::error::{LedgerError, Result};
use crate::log::{LogEntry, LogReplay};

/// A live key and its current value, as returned by predicate search
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

/// Full-scan reader over one log file
pub struct Scanner<'a> {
    path: &'a Path,
    replay: LogReplay,
}

impl<'a> Scanner<'a> {
    pub fn new(path: &'a Path, recovery_mode: RecoveryMode) -> Self {
        Self {
            path,
            replay: LogReplay::new(recovery_mode),
        }
    }

    /// Current value of `key`, tracking only that key through the log
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut current = None;
        self.replay.for_each(self.path, |entry| {
            if entry.key() != key {
                return;
            }
            current = match entry {
                LogEntry::Put { value, .. } => Some(value),
                LogEntry::Tombstone { .. } => None,
            };
        })?;
        Ok(current)
    }

    /// Canonical state of the whole log
    pub fn state(&self) -> Result<HashMap<String, String>> {
        let (state, _) = self.replay.replay(self.path)?;
        Ok(state)
    }

    /// Entries of the canonical state that satisfy `predicate`
    ///
    /// The predicate only ever sees a key's latest live value; deleted keys
    /// are never offered to it.
    pub fn find<F>(&self, predicate: F) -> Result<Vec<Entry>>
    where
        F: Fn(&str, &str) -> bool,
    {
        let state = self.state()?;
        matching(state.iter().map(|(k, v)| (k.as_str(), v.as_str())), predicate)
    }
}

/// Collect the pairs satisfying `predicate`; no match is `NotFound`
pub fn matching<'e, I, F>(entries: I, predicate: F) -> Result<Vec<Entry>>
where
    I: IntoIterator<Item = (&'e str, &'e str)>,
    F: Fn(&str, &str) -> bool,
{
    let found: Vec<Entry> = entries
        .into_iter()
        .filter(|&(key, value)| predicate(key, value))
        .map(|(key, value)| Entry {
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect();

    if found.is_empty() {
        return Err(LedgerError::NotFound);
    }
    Ok(found)
}
