//! Index Tests
//!
//! Tests verify:
//! - Basic insert/get/remove
//! - Capacity checks (new keys vs. overwrites)
//! - Loading a replayed state that exceeds capacity
//! - Iteration

use std::collections::HashMap;

use ledgerkv::index::Index;
use ledgerkv::LedgerError;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_index_is_empty() {
    let index = Index::new(10);
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());
    assert!(!index.is_full());
    assert_eq!(index.max_entries(), 10);
}

#[test]
fn test_insert_and_get() {
    let mut index = Index::new(10);

    index.insert("key1".to_string(), "value1".to_string());

    assert_eq!(index.get("key1"), Some("value1"));
    assert!(index.contains_key("key1"));
}

#[test]
fn test_get_nonexistent_key() {
    let index = Index::new(10);
    assert_eq!(index.get("nonexistent"), None);
}

#[test]
fn test_insert_overwrites_existing() {
    let mut index = Index::new(10);

    assert_eq!(index.insert("k".to_string(), "a".to_string()), None);
    assert_eq!(
        index.insert("k".to_string(), "b".to_string()),
        Some("a".to_string())
    );

    assert_eq!(index.len(), 1);
    assert_eq!(index.get("k"), Some("b"));
}

#[test]
fn test_remove() {
    let mut index = Index::new(10);
    index.insert("k".to_string(), "v".to_string());

    assert_eq!(index.remove("k"), Some("v".to_string()));
    assert_eq!(index.get("k"), None);
    assert_eq!(index.remove("k"), None);
    assert!(index.is_empty());
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_check_insert_below_capacity() {
    let mut index = Index::new(2);
    index.insert("a".to_string(), "1".to_string());

    assert!(index.check_insert("b").is_ok());
}

#[test]
fn test_check_insert_new_key_at_capacity() {
    let mut index = Index::new(2);
    index.insert("a".to_string(), "1".to_string());
    index.insert("b".to_string(), "2".to_string());

    assert!(index.is_full());
    assert!(matches!(
        index.check_insert("c"),
        Err(LedgerError::Capacity { limit: 2 })
    ));
}

#[test]
fn test_check_insert_existing_key_at_capacity() {
    let mut index = Index::new(2);
    index.insert("a".to_string(), "1".to_string());
    index.insert("b".to_string(), "2".to_string());

    assert!(index.check_insert("a").is_ok());
}

#[test]
fn test_remove_frees_capacity() {
    let mut index = Index::new(1);
    index.insert("a".to_string(), "1".to_string());
    assert!(index.check_insert("b").is_err());

    index.remove("a");
    assert!(index.check_insert("b").is_ok());
}

#[test]
fn test_from_state_over_capacity() {
    let state: HashMap<String, String> = (0..5)
        .map(|i| (format!("k{}", i), format!("v{}", i)))
        .collect();

    let index = Index::from_state(state, 3);

    assert_eq!(index.len(), 5);
    assert!(index.is_full());
    assert!(index.check_insert("new").is_err());
    assert!(index.check_insert("k0").is_ok());
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iter_yields_every_live_pair() {
    let mut index = Index::new(10);
    index.insert("a".to_string(), "1".to_string());
    index.insert("b".to_string(), "2".to_string());
    index.insert("c".to_string(), "3".to_string());
    index.remove("b");

    let mut pairs: Vec<(&str, &str)> = index.iter().collect();
    pairs.sort();

    assert_eq!(pairs, vec![("a", "1"), ("c", "3")]);
}
