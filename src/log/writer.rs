//! Log Writer
//!
//! Handles appending records to the log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{LedgerError, Result};

use super::LogEntry;

/// Storage a [`LogWriter`] appends to
///
/// Implemented for [`File`]; other implementations exist to exercise the
/// writer's failure paths.
pub trait LogFile: Write {
    /// Flush written data to durable storage
    fn sync_data(&mut self) -> io::Result<()>;

    /// Cut the file back to `size` bytes
    fn set_len(&mut self, size: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&mut self, size: u64) -> io::Result<()> {
        File::set_len(self, size)
    }
}

/// Appends records to the log file
///
/// Records go straight to the file with a single `write_all` (no userspace
/// buffering), so a scan that opens the file afterwards sees every record
/// that `append` returned `Ok` for. Only the fsync is deferred under
/// [`SyncStrategy::EveryNEntries`].
///
/// An append that fails, in the write or in its fsync, is cut back off the
/// file before the error is returned. If that cut itself fails the writer
/// is poisoned and refuses every later append.
#[derive(Debug)]
pub struct LogWriter<F: LogFile = File> {
    file: F,
    path: PathBuf,
    sync_strategy: SyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
    /// Current file length in bytes
    size: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl LogWriter {
    /// Open or create a log file for appending
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();
        Ok(Self::from_parts(file, path, sync_strategy, size))
    }

    /// Create an empty log file, replacing any existing one
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        // Reopen in append mode so the handle behaves like `open`'s
        drop(file);
        Self::open(path, sync_strategy)
    }
}

impl<F: LogFile> LogWriter<F> {
    /// Wrap an already open log of `size` bytes
    pub fn from_parts(file: F, path: &Path, sync_strategy: SyncStrategy, size: u64) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            unsynced: 0,
            size,
            poisoned: false,
        }
    }

    /// Append a record to the log
    ///
    /// Returns the byte offset the record starts at. On `Err` the file holds
    /// exactly what it held before the call.
    pub fn append(&mut self, entry: &LogEntry) -> Result<u64> {
        if self.poisoned {
            return Err(LedgerError::Io(io::Error::new(
                io::ErrorKind::Other,
                "log writer is unusable after a failed rollback",
            )));
        }

        let buf = entry.encode()?;
        let offset = self.size;
        let unsynced = self.unsynced;

        if let Err(e) = self.write_record(&buf) {
            self.rollback(offset, unsynced)?;
            return Err(e);
        }

        self.size += buf.len() as u64;
        Ok(offset)
    }

    fn write_record(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf)?;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Cut the file back to `offset` after a failed append
    fn rollback(&mut self, offset: u64, unsynced: usize) -> Result<()> {
        self.unsynced = unsynced;

        if let Err(e) = self.file.set_len(offset) {
            self.poisoned = true;
            tracing::error!(
                path = %self.path.display(),
                offset,
                error = %e,
                "failed to roll back log append"
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Current length of the log in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_strategy(&self) -> SyncStrategy {
        self.sync_strategy
    }

    /// Appends not yet covered by an fsync
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }

    /// Whether a failed rollback has made the writer refuse appends
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Point the writer at the path its file was renamed to
    pub(crate) fn relocate(&mut self, path: &Path, sync_strategy: SyncStrategy) {
        self.path = path.to_path_buf();
        self.sync_strategy = sync_strategy;
    }
}

impl<F: LogFile> Drop for LogWriter<F> {
    fn drop(&mut self) {
        if self.unsynced > 0 {
            let _ = self.file.sync_data();
        }
    }
}
