//! Compactor Module
//!
//! Rewrites a log to one live record per key.
//!
//! ## Steps
//! 1. Write every (key, value) to `{log}.compact`
//! 2. fsync the temporary file
//! 3. Rename it over the live log (the commit point)
//!
//! Until step 3 succeeds the live log is never touched; any failure removes
//! the temporary file and leaves the original exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{LedgerError, Result};
use crate::log::{LogEntry, LogWriter};

/// Suffix of the temporary file a compaction writes into
pub const COMPACT_SUFFIX: &str = "compact";

/// Outcome of a successful compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    /// Live records in the rewritten log
    pub records_written: u64,

    /// Log size before compaction (bytes)
    pub bytes_before: u64,

    /// Log size after compaction (bytes)
    pub bytes_after: u64,
}

/// Rewrites one log file in place via a temporary sibling
pub struct Compactor {
    log_path: PathBuf,
    temp_path: PathBuf,
    sync_strategy: SyncStrategy,
}

impl Compactor {
    pub fn new(log_path: &Path, sync_strategy: SyncStrategy) -> Self {
        let mut name = log_path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(COMPACT_SUFFIX);

        Self {
            log_path: log_path.to_path_buf(),
            temp_path: log_path.with_file_name(name),
            sync_strategy,
        }
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Replace the log with exactly `entries`
    ///
    /// Returns a writer whose handle is the new live log, positioned for
    /// appends. The caller swaps it in for its old writer.
    pub fn compact<'e, I>(&self, entries: I) -> Result<(LogWriter, CompactionStats)>
    where
        I: IntoIterator<Item = (&'e str, &'e str)>,
    {
        let bytes_before = fs::metadata(&self.log_path)?.len();

        match self.rewrite(entries) {
            Ok((writer, records_written)) => {
                let stats = CompactionStats {
                    records_written,
                    bytes_before,
                    bytes_after: writer.size(),
                };
                Ok((writer, stats))
            }
            Err(e) => {
                let _ = fs::remove_file(&self.temp_path);
                Err(e)
            }
        }
    }

    fn rewrite<'e, I>(&self, entries: I) -> Result<(LogWriter, u64)>
    where
        I: IntoIterator<Item = (&'e str, &'e str)>,
    {
        // fsync once at the end instead of per record
        let deferred = SyncStrategy::EveryNEntries { count: usize::MAX };
        let mut writer = LogWriter::create(&self.temp_path, deferred)
            .map_err(|e| stage_error("creating temporary log", e))?;

        let mut records_written = 0;
        for (key, value) in entries {
            writer
                .append(&LogEntry::put(key, value))
                .map_err(|e| stage_error("writing temporary log", e))?;
            records_written += 1;
        }

        writer
            .sync()
            .map_err(|e| stage_error("syncing temporary log", e))?;

        fs::rename(&self.temp_path, &self.log_path).map_err(|source| {
            LedgerError::Compaction {
                stage: "renaming temporary log",
                source,
            }
        })?;

        writer.relocate(&self.log_path, self.sync_strategy);
        Ok((writer, records_written))
    }
}

fn stage_error(stage: &'static str, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Io(source) => LedgerError::Compaction { stage, source },
        other => other,
    }
}
