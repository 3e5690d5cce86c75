//! Index implementation
//!
//! HashMap-based key → value table with a capacity bound.

use std::collections::HashMap;

use crate::error::{LedgerError, Result};

/// In-memory map of every live key to its current value
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: HashMap<String, String>,
    max_entries: usize,
}

impl Index {
    /// Create a new empty Index
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
        }
    }

    /// Wrap a replayed state
    ///
    /// The state may already hold more than `max_entries` keys (advisory
    /// capacity); inserts of new keys are refused until it shrinks.
    pub fn from_state(entries: HashMap<String, String>, max_entries: usize) -> Self {
        Self {
            entries,
            max_entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Fail with `Capacity` if inserting `key` would add a key to a full index
    pub fn check_insert(&self, key: &str) -> Result<()> {
        if self.is_full() && !self.contains_key(key) {
            return Err(LedgerError::Capacity {
                limit: self.max_entries,
            });
        }
        Ok(())
    }

    /// Insert or overwrite, without a capacity check
    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Iterate over live (key, value) pairs, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once the key count has reached `max_entries`
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_entries
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
