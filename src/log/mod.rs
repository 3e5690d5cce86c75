//! Append-only Log Module
//!
//! The durable source of truth for a store.
//!
//! ## Responsibilities
//! - Append one self-contained record per mutation
//! - CRC32 checksums for corruption detection
//! - Ordered replay to rebuild the current state
//! - Repair of a torn final record after a crash
//!
//! ## File Format
//! One JSON object per line, in write order:
//! ```text
//! {"key":"k1","value":"v1","crc":<u32>}
//! {"key":"k2","value":"v2","crc":<u32>}
//! {"key":"k1","deleted":true,"crc":<u32>}
//! ```
//! - `value` is omitted on tombstones (and read as `""` if a live record lacks it)
//! - `deleted` is omitted unless true
//! - `crc` is optional on read; records written here always carry it

mod entry;
mod writer;
mod reader;
mod replay;

pub use entry::{DecodeError, LogEntry, RECORD_TERMINATOR};
pub use writer::{LogFile, LogWriter};
pub use reader::LogReader;
pub use replay::{LogReplay, ReplayResult, TailRepair};
