//! Tests for AOF Writer
//!
//! These tests verify:
//! - Records land one per line in append order
//! - Reopening appends instead of truncating
//! - Sync strategies track unsynced records

use std::fs;
use std::path::PathBuf;

use cinderkv::aof::{AofWriter, Record};
use cinderkv::config::AofSyncStrategy;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_aof() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let aof_path = temp_dir.path().join("test.aof");
    (temp_dir, aof_path)
}

fn set(key: &str, value: &str) -> Record {
    Record::Set { key: key.into(), value: value.into() }
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, path) = setup_temp_aof();

    let writer = AofWriter::open(&path, AofSyncStrategy::EveryWrite).unwrap();

    assert!(path.exists());
    assert_eq!(writer.records_written(), 0);
    assert_eq!(writer.path(), path.as_path());
}

#[test]
fn test_append_writes_lines() {
    let (_temp, path) = setup_temp_aof();
    let mut writer = AofWriter::open(&path, AofSyncStrategy::EveryWrite).unwrap();

    writer.append(&set("a", "1")).unwrap();
    writer.append(&Record::RPush { key: "l".into(), value: "x".into() }).unwrap();
    writer.append(&Record::Expire { key: "a".into(), seconds: 30 }).unwrap();

    assert_eq!(writer.records_written(), 3);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "SET a 1\nRPUSH l x\nEXPIRE a 30\n"
    );
}

#[test]
fn test_reopen_appends() {
    let (_temp, path) = setup_temp_aof();

    {
        let mut writer = AofWriter::open(&path, AofSyncStrategy::EveryWrite).unwrap();
        writer.append(&set("a", "1")).unwrap();
    }
    {
        let mut writer = AofWriter::open(&path, AofSyncStrategy::EveryWrite).unwrap();
        writer.append(&set("b", "2")).unwrap();
    }

    assert_eq!(fs::read_to_string(&path).unwrap(), "SET a 1\nSET b 2\n");
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_every_write_leaves_nothing_unsynced() {
    let (_temp, path) = setup_temp_aof();
    let mut writer = AofWriter::open(&path, AofSyncStrategy::EveryWrite).unwrap();

    writer.append(&set("a", "1")).unwrap();

    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_every_n_records_syncs_on_threshold() {
    let (_temp, path) = setup_temp_aof();
    let mut writer =
        AofWriter::open(&path, AofSyncStrategy::EveryNRecords { count: 3 }).unwrap();

    writer.append(&set("a", "1")).unwrap();
    writer.append(&set("b", "2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    writer.append(&set("c", "3")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(&set("d", "4")).unwrap();
    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_unsynced_records_are_still_visible() {
    let (_temp, path) = setup_temp_aof();
    let mut writer =
        AofWriter::open(&path, AofSyncStrategy::EveryNRecords { count: 100 }).unwrap();

    writer.append(&set("a", "1")).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "SET a 1\n");
}
