//! Log record definitions
//!
//! Defines the structure of individual log records and their line encoding.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{LedgerError, Result};

/// Byte that ends every record
pub const RECORD_TERMINATOR: u8 = b'\n';

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Set `key` to `value`
    Put { key: String, value: String },

    /// Delete `key`
    Tombstone { key: String },
}

/// Why a line could not be turned back into a [`LogEntry`]
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    Checksum { stored: u32, computed: u32 },
}

impl DecodeError {
    /// Whether the bytes are not even well-formed JSON, as left behind by an
    /// interrupted append
    ///
    /// A record that parses but has the wrong shape or a bad checksum is not
    /// partial.
    pub fn is_partial(&self) -> bool {
        matches!(self, DecodeError::Malformed(e) if !e.is_data())
    }
}

/// On-disk shape, used for encoding
#[derive(Serialize)]
struct RecordRef<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "is_false")]
    deleted: bool,
    crc: u32,
}

/// On-disk shape, used for decoding
#[derive(Deserialize)]
struct RawRecord {
    key: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    crc: Option<u32>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

fn checksum(key: &str, deleted: bool, value: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&(key.len() as u32).to_le_bytes());
    hasher.update(key.as_bytes());
    hasher.update(&[deleted as u8]);
    hasher.update(value.as_bytes());
    hasher.finalize()
}

impl LogEntry {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        LogEntry::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn tombstone(key: impl Into<String>) -> Self {
        LogEntry::Tombstone { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            LogEntry::Put { key, .. } | LogEntry::Tombstone { key } => key,
        }
    }

    /// The live value, `None` for a tombstone
    pub fn value(&self) -> Option<&str> {
        match self {
            LogEntry::Put { value, .. } => Some(value),
            LogEntry::Tombstone { .. } => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, LogEntry::Tombstone { .. })
    }

    /// Encode as one terminated line
    pub fn encode(&self) -> Result<BytesMut> {
        let (value, deleted) = match self {
            LogEntry::Put { value, .. } => (Some(value.as_str()), false),
            LogEntry::Tombstone { .. } => (None, true),
        };
        let record = RecordRef {
            key: self.key(),
            value,
            deleted,
            crc: checksum(self.key(), deleted, value.unwrap_or_default()),
        };

        let capacity = 48 + self.key().len() + value.map_or(0, str::len);
        let mut writer = BytesMut::with_capacity(capacity).writer();
        serde_json::to_writer(&mut writer, &record)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut buf = writer.into_inner();
        buf.put_u8(RECORD_TERMINATOR);
        Ok(buf)
    }

    /// Decode one line (terminator already stripped)
    pub fn decode(line: &[u8]) -> std::result::Result<Self, DecodeError> {
        let raw: RawRecord = serde_json::from_slice(line)?;

        // A tombstone's value is never authoritative
        let value = if raw.deleted {
            String::new()
        } else {
            raw.value.unwrap_or_default()
        };

        if let Some(stored) = raw.crc {
            let computed = checksum(&raw.key, raw.deleted, &value);
            if stored != computed {
                return Err(DecodeError::Checksum { stored, computed });
            }
        }

        Ok(if raw.deleted {
            LogEntry::Tombstone { key: raw.key }
        } else {
            LogEntry::Put {
                key: raw.key,
                value,
            }
        })
    }
}
