//! Concrete scenarios exercising durability, abort, and recovery behavior
//! end to end.

use pretty_assertions::assert_eq;

use super::helpers::enable_logging;
use crate::region::Region;
use crate::txn;

#[test]
fn s1_simple_durable_write_survives_a_simulated_crash() {
    enable_logging();
    let dir = tempfile::TempDir::new().unwrap();

    {
        let mut region = Region::init(dir.path()).unwrap();
        let base = region.map("s1", 100).unwrap();

        let tx = txn::begin_trans(&mut region, &[base]).unwrap();
        txn::about_to_modify(&mut region, &tx, base, 0, 5).unwrap();
        region.segment_mut(base).unwrap()[0..5].copy_from_slice(b"HELLO");
        txn::commit_trans(&mut region, tx).unwrap();
        // `region` is dropped here: simulates the process exiting after
        // commit returned, with no explicit `unmap`.
    }

    // A fresh `Region` over the same directory simulates a new process.
    let mut region2 = Region::init(dir.path()).unwrap();
    let base2 = region2.map("s1", 100).unwrap();
    assert_eq!(&region2.segment(base2).unwrap()[0..5], b"HELLO");
}

#[test]
fn s2_abort_restores_pre_image() {
    enable_logging();
    let dir = tempfile::TempDir::new().unwrap();

    let mut region = Region::init(dir.path()).unwrap();
    let base = region.map("s1", 100).unwrap();
    let tx = txn::begin_trans(&mut region, &[base]).unwrap();
    txn::about_to_modify(&mut region, &tx, base, 0, 5).unwrap();
    region.segment_mut(base).unwrap()[0..5].copy_from_slice(b"HELLO");
    txn::commit_trans(&mut region, tx).unwrap();

    let tx2 = txn::begin_trans(&mut region, &[base]).unwrap();
    txn::about_to_modify(&mut region, &tx2, base, 0, 5).unwrap();
    region.segment_mut(base).unwrap()[0..5].copy_from_slice(b"WORLD");
    txn::abort_trans(&mut region, tx2);

    assert_eq!(&region.segment(base).unwrap()[0..5], b"HELLO");
}

#[test]
fn s3_overlap_conflict_leaves_state_untouched() {
    enable_logging();
    let dir = tempfile::TempDir::new().unwrap();

    let mut region = Region::init(dir.path()).unwrap();
    let b1 = region.map("b1", 16).unwrap();
    let b2 = region.map("b2", 16).unwrap();
    let b3 = region.map("b3", 16).unwrap();

    let tx = txn::begin_trans(&mut region, &[b1, b2]).unwrap();

    let err = txn::begin_trans(&mut region, &[b2, b3]).unwrap_err();
    assert!(matches!(
        err,
        crate::error::Error::Usage(crate::error::UsageError::SegmentBusy)
    ));

    // b3 must not have been marked dirty by the failed attempt: a fresh
    // begin_trans over just b3 must succeed.
    let tx_b3 = txn::begin_trans(&mut region, &[b3]).unwrap();
    txn::abort_trans(&mut region, tx_b3);

    txn::abort_trans(&mut region, tx);
}

#[test]
fn s4_torn_tail_is_discarded_on_truncate() {
    enable_logging();
    let dir = tempfile::TempDir::new().unwrap();
    let mut region = Region::init(dir.path()).unwrap();
    let base = region.map("s1", 100).unwrap();

    let tx = txn::begin_trans(&mut region, &[base]).unwrap();
    txn::about_to_modify(&mut region, &tx, base, 0, 5).unwrap();
    region.segment_mut(base).unwrap()[0..5].copy_from_slice(b"HELLO");
    txn::commit_trans(&mut region, tx).unwrap();

    // Hand-craft a torn trailing record directly on disk.
    use std::io::Write;
    let log_path = crate::backend::log_path(&dir.path().join("s1"));
    let mut log = std::fs::OpenOptions::new().append(true).open(&log_path).unwrap();
    log.write_all(&[9, 9, 9]).unwrap();

    region.truncate_log().unwrap();

    let log_bytes = std::fs::read(&log_path).unwrap();
    assert!(log_bytes.is_empty());

    let mut region2 = Region::init(dir.path()).unwrap();
    let base2 = region2.map("s1", 100).unwrap();
    assert_eq!(&region2.segment(base2).unwrap()[0..5], b"HELLO");
}

#[test]
fn s5_extend_on_map_preserves_prefix_and_zero_fills_tail() {
    enable_logging();
    let dir = tempfile::TempDir::new().unwrap();

    {
        let mut region = Region::init(dir.path()).unwrap();
        let base = region.map("s2", 10).unwrap();
        let tx = txn::begin_trans(&mut region, &[base]).unwrap();
        txn::about_to_modify(&mut region, &tx, base, 0, 10).unwrap();
        region.segment_mut(base).unwrap().fill(0xAA);
        txn::commit_trans(&mut region, tx).unwrap();
    }

    let mut region2 = Region::init(dir.path()).unwrap();
    let base2 = region2.map("s2", 20).unwrap();
    let bytes = region2.segment(base2).unwrap();
    assert_eq!(&bytes[0..10], &[0xAAu8; 10]);
    assert_eq!(&bytes[10..20], &[0u8; 10]);
}

#[test]
fn s6_lifo_abort_ordering() {
    enable_logging();
    let dir = tempfile::TempDir::new().unwrap();
    let mut region = Region::init(dir.path()).unwrap();
    let base = region.map("s1", 16).unwrap();

    region.segment_mut(base).unwrap()[0..4].copy_from_slice(b"AAAA");

    let tx = txn::begin_trans(&mut region, &[base]).unwrap();
    txn::about_to_modify(&mut region, &tx, base, 0, 4).unwrap();
    region.segment_mut(base).unwrap()[0..4].copy_from_slice(b"BBBB");
    txn::about_to_modify(&mut region, &tx, base, 0, 4).unwrap();
    region.segment_mut(base).unwrap()[0..4].copy_from_slice(b"CCCC");

    txn::abort_trans(&mut region, tx);

    assert_eq!(&region.segment(base).unwrap()[0..4], b"AAAA");
}
