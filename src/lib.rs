//! # LedgerKV
//!
//! An embeddable key-value store with:
//! - An append-only log as the single source of truth
//! - An optional in-memory index for O(1) reads
//! - Tombstone deletes and crash-safe log compaction
//! - Predicate search over the current state
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                               │
//! │          (validation, one readers-writer lock)               │
//! └──────┬──────────────────┬──────────────────┬────────────────┘
//!        │ set/delete       │ get/find_by      │ compact
//!        ▼                  ▼                  ▼
//!   ┌─────────┐      ┌─────────────┐    ┌─────────────┐
//!   │   Log   │      │    Index    │    │  Compactor  │
//!   │(Append) │      │ (optional)  │    │(tmp+rename) │
//!   └────┬────┘      └─────────────┘    └─────────────┘
//!        │                  ▲ no index
//!        │           ┌──────┴──────┐
//!        └──────────▶│   Scanner   │
//!                    │ (full scan) │
//!                    └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ledgerkv::{Config, Store};
//!
//! # fn main() -> ledgerkv::Result<()> {
//! let store = Store::open("data/store.log", Config::default())?;
//! store.set("k1", "v1")?;
//! assert_eq!(store.get("k1")?, Some("v1".to_string()));
//!
//! let hits = store.find_by(|key, value| key == "k1" || value == "v2")?;
//! assert_eq!(hits.len(), 1);
//!
//! store.compact()?;
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod index;
pub mod scanner;
pub mod compactor;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LedgerError, Result};
pub use config::Config;
pub use scanner::Entry;
pub use compactor::CompactionStats;
pub use store::{Store, StoreStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LedgerKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
