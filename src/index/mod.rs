//! Index Module
//!
//! Optional in-memory mirror of the log's current state.
//!
//! ## Responsibilities
//! - O(1) point reads
//! - Bound the number of distinct keys (`max_entries`)
//! - Supply the authoritative state for predicate search and compaction
//!
//! ## Data Structure Choice
//! A plain HashMap with no lock of its own: the store's single RwLock
//! guards the index and the log handle together, so the two never drift.
//! Tombstones are not kept; a deleted key is simply absent.

mod table;

pub use table::Index;
