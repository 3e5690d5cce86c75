//! Tests for LogWriter
//!
//! These tests verify:
//! - Appending records and tracking offsets/size
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - open() appends to an existing log, create() replaces it
//! - Integration with reader

use std::fs;
use std::path::PathBuf;

use ledgerkv::config::SyncStrategy;
use ledgerkv::log::{LogEntry, LogReader, LogWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.log");
    (temp_dir, log_path)
}

fn read_all(path: &PathBuf) -> Vec<LogEntry> {
    LogReader::open(path)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, log_path) = setup_temp_log();

    let writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();

    assert!(log_path.exists());
    assert_eq!(writer.size(), 0);
    assert_eq!(writer.path(), log_path.as_path());
}

#[test]
fn test_append_returns_record_offsets() {
    let (_temp, log_path) = setup_temp_log();
    let mut writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();

    let first = LogEntry::put("a", "1");
    let first_len = first.encode().unwrap().len() as u64;

    assert_eq!(writer.append(&first).unwrap(), 0);
    assert_eq!(writer.append(&LogEntry::tombstone("a")).unwrap(), first_len);
}

#[test]
fn test_size_matches_file_length() {
    let (_temp, log_path) = setup_temp_log();
    let mut writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();

    for i in 0..10 {
        writer
            .append(&LogEntry::put(format!("key{}", i), format!("value{}", i)))
            .unwrap();
    }

    assert_eq!(writer.size(), fs::metadata(&log_path).unwrap().len());
}

#[test]
fn test_written_records_read_back_in_order() {
    let (_temp, log_path) = setup_temp_log();
    let entries = vec![
        LogEntry::put("k1", "v1"),
        LogEntry::put("k2", "v2"),
        LogEntry::tombstone("k1"),
        LogEntry::put("k1", "v3"),
    ];

    {
        let mut writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();
        for entry in &entries {
            writer.append(entry).unwrap();
        }
    }

    assert_eq!(read_all(&log_path), entries);
}

#[test]
fn test_appends_visible_before_sync() {
    let (_temp, log_path) = setup_temp_log();
    let mut writer =
        LogWriter::open(&log_path, SyncStrategy::EveryNEntries { count: 100 }).unwrap();

    writer.append(&LogEntry::put("k", "v")).unwrap();

    assert_eq!(writer.unsynced(), 1);
    assert_eq!(read_all(&log_path), vec![LogEntry::put("k", "v")]);
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_open_appends_to_existing_log() {
    let (_temp, log_path) = setup_temp_log();

    {
        let mut writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();
        writer.append(&LogEntry::put("a", "1")).unwrap();
    }

    let existing = fs::metadata(&log_path).unwrap().len();
    let mut writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.size(), existing);

    assert_eq!(writer.append(&LogEntry::put("b", "2")).unwrap(), existing);
    assert_eq!(
        read_all(&log_path),
        vec![LogEntry::put("a", "1"), LogEntry::put("b", "2")]
    );
}

#[test]
fn test_create_replaces_existing_log() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, "{\"key\":\"old\",\"value\":\"x\"}\n").unwrap();

    let mut writer = LogWriter::create(&log_path, SyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.size(), 0);

    writer.append(&LogEntry::put("new", "y")).unwrap();
    assert_eq!(read_all(&log_path), vec![LogEntry::put("new", "y")]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_every_write_leaves_nothing_unsynced() {
    let (_temp, log_path) = setup_temp_log();
    let mut writer = LogWriter::open(&log_path, SyncStrategy::EveryWrite).unwrap();

    writer.append(&LogEntry::put("k", "v")).unwrap();

    assert_eq!(writer.unsynced(), 0);
    assert_eq!(writer.sync_strategy(), SyncStrategy::EveryWrite);
}

#[test]
fn test_every_n_entries_syncs_on_threshold() {
    let (_temp, log_path) = setup_temp_log();
    let mut writer =
        LogWriter::open(&log_path, SyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(&LogEntry::put("a", "1")).unwrap();
    writer.append(&LogEntry::put("b", "2")).unwrap();
    assert_eq!(writer.unsynced(), 2);

    writer.append(&LogEntry::put("c", "3")).unwrap();
    assert_eq!(writer.unsynced(), 0);
}

#[test]
fn test_manual_sync_resets_counter() {
    let (_temp, log_path) = setup_temp_log();
    let mut writer =
        LogWriter::open(&log_path, SyncStrategy::EveryNEntries { count: 10 }).unwrap();

    writer.append(&LogEntry::put("a", "1")).unwrap();
    writer.sync().unwrap();

    assert_eq!(writer.unsynced(), 0);
}
