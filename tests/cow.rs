#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Copy-on-write and sharing tests
//! Clones must share storage until one side mutates, and no mutation on one
//! handle may ever be observable through another.

use packet_tags::TagLedger;

/// Collect (type_id, start, end, payload) for every record, full window.
fn snapshot(ledger: &TagLedger) -> Vec<(u32, u32, u32, Vec<u8>)> {
    ledger
        .begin(0, u32::MAX)
        .map(|t| (t.type_id, t.start, t.end, t.payload().to_vec()))
        .collect()
}

fn ledger_with_records() -> TagLedger {
    let mut ledger = TagLedger::new();
    ledger
        .append(1, 4, 0, 100)
        .expect("append")
        .copy_from_slice(&[1, 2, 3, 4]);
    ledger
        .append(2, 2, 200, 300)
        .expect("append")
        .copy_from_slice(&[5, 6]);
    ledger
}

// ============================================================================
// SHARING
// ============================================================================

#[test]
fn test_clone_copies_no_bytes() {
    let ledger = ledger_with_records();
    let copy = ledger.clone();
    assert!(ledger.shares_storage_with(&copy));
    assert_eq!(snapshot(&ledger), snapshot(&copy));
}

#[test]
fn test_reads_never_unshare() {
    let ledger = ledger_with_records();
    let copy = ledger.clone();

    let _ = copy.len();
    let _ = copy.stats();
    let _ = copy.begin(0, u32::MAX).count();
    let _ = ledger.begin(50, 250).count();

    assert!(ledger.shares_storage_with(&copy));
}

#[test]
fn test_many_clones_share_one_block() {
    let ledger = ledger_with_records();
    let clones: Vec<TagLedger> = (0..10).map(|_| ledger.clone()).collect();
    for clone in &clones {
        assert!(ledger.shares_storage_with(clone));
    }
    assert!(ledger.stats().shared);
}

// ============================================================================
// COW CORRECTNESS
// ============================================================================

#[test]
fn test_append_to_clone_leaves_original_untouched() {
    let original = ledger_with_records();
    let before = snapshot(&original);

    let mut copy = original.clone();
    copy.append(3, 1, 400, 500)
        .expect("append")
        .copy_from_slice(&[7]);

    assert_eq!(snapshot(&original), before);
    assert_eq!(copy.len(), 3);
    assert!(!original.shares_storage_with(&copy));
}

#[test]
fn test_append_to_original_leaves_clone_untouched() {
    let mut original = ledger_with_records();
    let copy = original.clone();
    let before = snapshot(&copy);

    original.append(3, 0, 400, 500).expect("append");

    assert_eq!(snapshot(&copy), before);
    assert_eq!(original.len(), 3);
}

#[test]
fn test_divergent_clones_are_independent() {
    let base = ledger_with_records();
    let mut left = base.clone();
    let mut right = base.clone();

    left.append(10, 0, 1000, 1100).expect("append");
    right.append(20, 0, 2000, 2100).expect("append");

    let left_ids: Vec<u32> = left.begin(0, u32::MAX).map(|t| t.type_id).collect();
    let right_ids: Vec<u32> = right.begin(0, u32::MAX).map(|t| t.type_id).collect();
    assert_eq!(left_ids, vec![1, 2, 10]);
    assert_eq!(right_ids, vec![1, 2, 20]);
    assert_eq!(base.len(), 2);
}

#[test]
fn test_rebase_on_clone_leaves_original_untouched() {
    let original = ledger_with_records();
    let before = snapshot(&original);

    let mut copy = original.clone();
    copy.rebase_on_append(50, 150).expect("rebase");

    assert_eq!(snapshot(&original), before);
    let ranges: Vec<(u32, u32)> = copy.begin(0, u32::MAX).map(|t| (t.start, t.end)).collect();
    assert_eq!(ranges, vec![(0, 100), (250, 350)]);
}

// ============================================================================
// CLEAR ISOLATION
// ============================================================================

#[test]
fn test_clear_does_not_reduce_sibling_record_count() {
    let mut ledger = ledger_with_records();
    let copy = ledger.clone();

    ledger.clear();

    assert_eq!(ledger.len(), 0);
    assert!(ledger.is_empty());
    assert_eq!(copy.len(), 2);
    assert_eq!(snapshot(&copy), snapshot(&ledger_with_records()));
}

#[test]
fn test_cleared_ledger_is_reusable() {
    let mut ledger = ledger_with_records();
    ledger.clear();
    ledger.append(9, 0, 0, 1).expect("append after clear");
    assert_eq!(ledger.len(), 1);
}

// ============================================================================
// MERGE FIDELITY
// ============================================================================

#[test]
fn test_merge_yields_a_then_b_byte_for_byte() {
    let a = ledger_with_records();
    let mut b = TagLedger::new();
    b.append(7, 3, 500, 600)
        .expect("append")
        .copy_from_slice(&[9, 9, 9]);

    let mut merged = a.clone();
    merged.merge(&b).expect("merge");

    let mut expected = snapshot(&a);
    expected.extend(snapshot(&b));
    assert_eq!(snapshot(&merged), expected);
}

#[test]
fn test_merge_does_not_disturb_either_source() {
    let a = ledger_with_records();
    let b = ledger_with_records();
    let a_before = snapshot(&a);
    let b_before = snapshot(&b);

    let mut merged = TagLedger::new();
    merged.merge(&a).expect("merge a");
    merged.merge(&b).expect("merge b");

    assert_eq!(snapshot(&a), a_before);
    assert_eq!(snapshot(&b), b_before);
    assert_eq!(merged.len(), 4);
}
