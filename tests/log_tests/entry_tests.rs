//! Tests for LogEntry
//!
//! These tests verify:
//! - Line encoding (one terminated JSON object per record)
//! - Decoding of records written by other encoders of the same schema
//! - Tombstone invariant (a deleted record's value is ignored)
//! - Corruption detection (malformed JSON, CRC mismatch)

use ledgerkv::log::{DecodeError, LogEntry, RECORD_TERMINATOR};

// =============================================================================
// Helper Functions
// =============================================================================

fn encode_line(entry: &LogEntry) -> String {
    let bytes = entry.encode().unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn strip(line: &str) -> &[u8] {
    line.trim_end_matches('\n').as_bytes()
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_put_is_single_terminated_line() {
    let line = encode_line(&LogEntry::put("k1", "v1"));

    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);
    assert!(line.starts_with(r#"{"key":"k1","value":"v1","crc":"#));
    assert!(!line.contains("deleted"));
}

#[test]
fn test_encode_tombstone_omits_value() {
    let line = encode_line(&LogEntry::tombstone("k1"));

    assert!(line.starts_with(r#"{"key":"k1","deleted":true,"crc":"#));
    assert!(!line.contains("value"));
}

#[test]
fn test_encode_escapes_embedded_newlines() {
    let entry = LogEntry::put("multi\nline", "a\nb\r\nc");
    let bytes = entry.encode().unwrap();

    let terminators = bytes.iter().filter(|&&b| b == RECORD_TERMINATOR).count();
    assert_eq!(terminators, 1);
    assert_eq!(LogEntry::decode(&bytes[..bytes.len() - 1]).unwrap(), entry);
}

#[test]
fn test_encode_decode_preserves_unicode() {
    let entry = LogEntry::put("ключ", "値 🚀");
    let line = encode_line(&entry);

    assert_eq!(LogEntry::decode(strip(&line)).unwrap(), entry);
}

#[test]
fn test_encode_decode_empty_value() {
    let entry = LogEntry::put("k", "");
    let line = encode_line(&entry);

    assert_eq!(LogEntry::decode(strip(&line)).unwrap(), entry);
}

// =============================================================================
// Accessor Tests
// =============================================================================

#[test]
fn test_accessors() {
    let put = LogEntry::put("a", "1");
    let tombstone = LogEntry::tombstone("b");

    assert_eq!(put.key(), "a");
    assert_eq!(put.value(), Some("1"));
    assert!(!put.is_tombstone());

    assert_eq!(tombstone.key(), "b");
    assert_eq!(tombstone.value(), None);
    assert!(tombstone.is_tombstone());
}

// =============================================================================
// Foreign Record Tests
// =============================================================================

#[test]
fn test_decode_record_without_crc() {
    let entry = LogEntry::decode(br#"{"key":"a","value":"b"}"#).unwrap();
    assert_eq!(entry, LogEntry::put("a", "b"));
}

#[test]
fn test_decode_missing_value_is_empty_string() {
    let entry = LogEntry::decode(br#"{"key":"a"}"#).unwrap();
    assert_eq!(entry, LogEntry::put("a", ""));
}

#[test]
fn test_decode_deleted_record_ignores_value() {
    let entry = LogEntry::decode(br#"{"key":"a","value":"stale","deleted":true}"#).unwrap();
    assert_eq!(entry, LogEntry::tombstone("a"));
}

#[test]
fn test_decode_explicit_not_deleted() {
    let entry = LogEntry::decode(br#"{"key":"a","value":"b","deleted":false}"#).unwrap();
    assert_eq!(entry, LogEntry::put("a", "b"));
}

#[test]
fn test_decode_ignores_unknown_fields() {
    let entry = LogEntry::decode(br#"{"key":"a","value":"b","written_by":"other"}"#).unwrap();
    assert_eq!(entry, LogEntry::put("a", "b"));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_decode_malformed_json() {
    let result = LogEntry::decode(b"not json at all");
    assert!(matches!(result, Err(DecodeError::Malformed(_))));
}

#[test]
fn test_decode_missing_key() {
    let result = LogEntry::decode(br#"{"value":"b"}"#);
    assert!(matches!(result, Err(DecodeError::Malformed(_))));
}

#[test]
fn test_decode_truncated_record() {
    let line = encode_line(&LogEntry::put("key", "value"));
    let truncated = &line.as_bytes()[..line.len() / 2];

    assert!(matches!(LogEntry::decode(truncated), Err(DecodeError::Malformed(_))));
}

#[test]
fn test_partial_only_for_unparseable_bytes() {
    let line = encode_line(&LogEntry::put("key", "value"));
    let truncated = &line.as_bytes()[..line.len() / 2];
    assert!(LogEntry::decode(truncated).unwrap_err().is_partial());
    assert!(LogEntry::decode(b"not json at all").unwrap_err().is_partial());

    assert!(!LogEntry::decode(br#"{"value":"b"}"#).unwrap_err().is_partial());
    assert!(!LogEntry::decode(br#"{"key":"b","value":"2","crc":1}"#)
        .unwrap_err()
        .is_partial());
}

#[test]
fn test_decode_detects_tampered_value() {
    let line = encode_line(&LogEntry::put("k1", "v1"));
    let tampered = line.replace(r#""value":"v1""#, r#""value":"v2""#);

    let result = LogEntry::decode(strip(&tampered));
    assert!(matches!(result, Err(DecodeError::Checksum { .. })));
}

#[test]
fn test_decode_detects_flipped_deleted_flag() {
    let line = encode_line(&LogEntry::put("k1", ""));
    let tampered = line.replace(r#""value":"""#, r#""deleted":true"#);

    let result = LogEntry::decode(strip(&tampered));
    assert!(matches!(result, Err(DecodeError::Checksum { .. })));
}
