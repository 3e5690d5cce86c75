//! Configuration for LedgerKV
//!
//! Centralized configuration with sensible defaults. A store's config is
//! fixed when it is opened.

use crate::error::{LedgerError, Result};

/// Main configuration for a LedgerKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Keep the replayed state in memory for O(1) reads.
    /// When disabled, every read scans the log.
    pub use_memory_index: bool,

    /// Cap on distinct live keys (enforced only with the memory index)
    pub max_entries: usize,

    /// How load treats a log whose live keys exceed `max_entries`
    pub capacity_policy: CapacityPolicy,

    // -------------------------------------------------------------------------
    // Validation Limits
    // -------------------------------------------------------------------------
    /// Max key size (in bytes)
    pub max_key_bytes: usize,

    /// Max value size (in bytes)
    pub max_value_bytes: usize,

    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    /// What replay and scans do with records that fail to decode
    pub recovery_mode: RecoveryMode,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced appends (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Policy for persisted data that already exceeds `max_entries`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Load everything; the cap only applies to new keys after load
    Advisory,

    /// Refuse to open the store
    Strict,
}

/// Policy for malformed records found while reading the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Skip the record with a warning and keep going
    SkipCorrupt,

    /// Fail the whole replay or scan
    Strict,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_memory_index: true,
            max_entries: 10_000,
            capacity_policy: CapacityPolicy::Advisory,
            max_key_bytes: 256,
            max_value_bytes: 4096,
            sync_strategy: SyncStrategy::EveryWrite,
            recovery_mode: RecoveryMode::SkipCorrupt,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no store can operate with
    pub fn validate(&self) -> Result<()> {
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(LedgerError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        if self.use_memory_index && self.max_entries == 0 {
            return Err(LedgerError::Config(
                "max_entries must be at least 1 when the memory index is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Enable or disable the in-memory index
    pub fn use_memory_index(mut self, enabled: bool) -> Self {
        self.config.use_memory_index = enabled;
        self
    }

    /// Set the maximum number of distinct keys
    pub fn max_entries(mut self, count: usize) -> Self {
        self.config.max_entries = count;
        self
    }

    /// Set the load-time capacity policy
    pub fn capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.config.capacity_policy = policy;
        self
    }

    /// Set the max key size (in bytes)
    pub fn max_key_bytes(mut self, size: usize) -> Self {
        self.config.max_key_bytes = size;
        self
    }

    /// Set the max value size (in bytes)
    pub fn max_value_bytes(mut self, size: usize) -> Self {
        self.config.max_value_bytes = size;
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the corrupt-record policy
    pub fn recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.config.recovery_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
