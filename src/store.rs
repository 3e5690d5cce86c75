//! Store Module
//!
//! The public face of LedgerKV: coordinates the log, the optional index,
//! the scanner and the compactor.
//!
//! ## Responsibilities
//! - Validate inputs before anything is written
//! - Append every mutation to the log, then mirror it into the index
//! - Route reads to the index or to a full log scan
//! - Rewrite the log on demand (compaction)

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::compactor::{CompactionStats, Compactor};
use crate::config::{CapacityPolicy, Config};
use crate::error::{Field, LedgerError, Result};
use crate::index::Index;
use crate::log::{LogEntry, LogReplay, LogWriter, TailRepair};
use crate::scanner::{self, Entry, Scanner};

/// Point-in-time summary of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Distinct live keys
    pub live_keys: usize,

    /// Current log size (bytes)
    pub log_bytes: u64,

    /// Whether reads are served from memory
    pub memory_index: bool,
}

/// An embeddable key-value store over a single append-only log file
///
/// ## Concurrency Model: one readers-writer lock
///
/// - **Exclusive**: `set`, `delete`, `compact`, `close`, `sync`
/// - **Shared**: `get`, `find_by`, `len`, `stats`
///
/// Unindexed reads scan the log file while holding the shared lock for the
/// whole scan, so they never observe a half-written append or a log being
/// replaced by compaction.
pub struct Store {
    /// Path of the log file
    path: PathBuf,

    /// Store configuration (fixed for the store's lifetime)
    config: Config,

    /// Log handle and index, guarded together
    state: RwLock<StoreState>,
}

struct StoreState {
    /// `None` once the store is closed
    writer: Option<LogWriter>,

    /// Present only when the memory index is enabled
    index: Option<Index>,
}

impl StoreState {
    fn writer(&self) -> Result<&LogWriter> {
        self.writer.as_ref().ok_or(LedgerError::Closed)
    }

    fn ensure_open(&self) -> Result<()> {
        self.writer().map(|_| ())
    }
}

impl Store {
    /// Open or create a store backed by the log at `path`
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the log (and its directory) if missing
    /// 3. Repair a torn final record, if any
    /// 4. Replay the log into the index (memory mode only)
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let repair = LogReplay::new(config.recovery_mode).repair_tail(&path)?;
        let writer = LogWriter::open(&path, config.sync_strategy)?;

        let index = if config.use_memory_index {
            Some(Self::load_index(&path, &config)?)
        } else {
            None
        };

        tracing::info!(
            path = %path.display(),
            memory_index = config.use_memory_index,
            log_bytes = writer.size(),
            tail_repaired = repair != TailRepair::Clean,
            "opened store"
        );

        Ok(Self {
            path,
            config,
            state: RwLock::new(StoreState {
                writer: Some(writer),
                index,
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses the default config
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Config::default())
    }

    /// Replay the log into a fresh index
    ///
    /// The capacity check looks at the canonical state after a complete
    /// replay; replay is never cut short.
    fn load_index(path: &Path, config: &Config) -> Result<Index> {
        let (state, result) = LogReplay::new(config.recovery_mode).replay(path)?;

        if result.live_keys > config.max_entries {
            match config.capacity_policy {
                CapacityPolicy::Strict => {
                    return Err(LedgerError::Load(format!(
                        "log holds {} live keys, exceeds max_entries ({})",
                        result.live_keys, config.max_entries
                    )));
                }
                CapacityPolicy::Advisory => {
                    tracing::warn!(
                        live_keys = result.live_keys,
                        max_entries = config.max_entries,
                        "log exceeds max_entries; new keys will be refused until compacted below the limit"
                    );
                }
            }
        }

        tracing::info!(
            records_applied = result.records_applied,
            records_skipped = result.records_skipped,
            live_keys = result.live_keys,
            "replayed log into memory index"
        );

        Ok(Index::from_state(state, config.max_entries))
    }

    /// Get the current value of `key`
    ///
    /// Memory mode is a hash lookup. Without the index this scans the whole
    /// log, so a read costs O(log length).
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let state = self.state.read();
        state.ensure_open()?;

        match &state.index {
            Some(index) => Ok(index.get(key).map(str::to_owned)),
            None => self.scanner().get(key),
        }
    }

    /// Set `key` to `value`
    ///
    /// Steps:
    /// 1. Validate sizes (and capacity, in memory mode)
    /// 2. Append to the log
    /// 3. Upsert the index, only after the append succeeded
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(LedgerError::Closed)?;

        self.validate(key, value)?;
        if let Some(index) = &state.index {
            index.check_insert(key)?;
        }

        writer.append(&LogEntry::put(key, value))?;

        if let Some(index) = state.index.as_mut() {
            index.insert(key.to_string(), value.to_string());
        }

        tracing::debug!(key, value_bytes = value.len(), "set");
        Ok(())
    }

    /// Delete `key`
    ///
    /// Always appends a tombstone, whether or not the key exists.
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let writer = state.writer.as_mut().ok_or(LedgerError::Closed)?;

        writer.append(&LogEntry::tombstone(key))?;

        if let Some(index) = state.index.as_mut() {
            index.remove(key);
        }

        tracing::debug!(key, "delete");
        Ok(())
    }

    /// All live entries for which `predicate(key, value)` holds
    ///
    /// An empty result is `Err(LedgerError::NotFound)`. Order is unspecified.
    pub fn find_by<F>(&self, predicate: F) -> Result<Vec<Entry>>
    where
        F: Fn(&str, &str) -> bool,
    {
        let state = self.state.read();
        state.ensure_open()?;

        match &state.index {
            Some(index) => scanner::matching(index.iter(), predicate),
            None => self.scanner().find(predicate),
        }
    }

    /// Rewrite the log to one record per live key
    ///
    /// The index is the source in memory mode; otherwise the log is
    /// replayed first. Runs entirely under the exclusive lock.
    pub fn compact(&self) -> Result<CompactionStats> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.ensure_open()?;

        let compactor = Compactor::new(&self.path, self.config.sync_strategy);
        let (writer, stats) = match &state.index {
            Some(index) => compactor.compact(index.iter())?,
            None => {
                let live = self.scanner().state()?;
                compactor.compact(live.iter().map(|(k, v)| (k.as_str(), v.as_str())))?
            }
        };

        // The old handle points at the replaced file
        state.writer = Some(writer);

        tracing::info!(
            records_written = stats.records_written,
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            "compacted log"
        );
        Ok(stats)
    }

    /// Force pending appends to disk
    pub fn sync(&self) -> Result<()> {
        let mut state = self.state.write();
        state.writer.as_mut().ok_or(LedgerError::Closed)?.sync()
    }

    /// Close the store
    ///
    /// Syncs and releases the log handle. Every later call, including
    /// another `close`, fails with `LedgerError::Closed`.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        let mut writer = state.writer.take().ok_or(LedgerError::Closed)?;
        state.index = None;

        writer.sync()?;
        tracing::debug!(path = %self.path.display(), "closed store");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> Result<usize> {
        let state = self.state.read();
        state.ensure_open()?;

        match &state.index {
            Some(index) => Ok(index.len()),
            None => Ok(self.scanner().state()?.len()),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Current log size in bytes
    pub fn log_size(&self) -> Result<u64> {
        Ok(self.state.read().writer()?.size())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let state = self.state.read();
        let log_bytes = state.writer()?.size();
        let live_keys = match &state.index {
            Some(index) => index.len(),
            None => self.scanner().state()?.len(),
        };

        Ok(StoreStats {
            live_keys,
            log_bytes,
            memory_index: state.index.is_some(),
        })
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().writer.is_none()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn scanner(&self) -> Scanner<'_> {
        Scanner::new(&self.path, self.config.recovery_mode)
    }

    fn validate(&self, key: &str, value: &str) -> Result<()> {
        if key.len() > self.config.max_key_bytes {
            return Err(LedgerError::Validation {
                field: Field::Key,
                len: key.len(),
                limit: self.config.max_key_bytes,
            });
        }
        if value.len() > self.config.max_value_bytes {
            return Err(LedgerError::Validation {
                field: Field::Value,
                len: value.len(),
                limit: self.config.max_value_bytes,
            });
        }
        Ok(())
    }
}
