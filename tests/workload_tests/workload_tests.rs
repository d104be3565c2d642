//! Tests for Operation and Workload
//!
//! These tests verify:
//! - Each operation drives the matching index call
//! - Workload replay returns per-step times in order
//! - Save/load through bincode files
//! - Error mapping for missing and corrupt files

use std::fs;

use cascadesim::{DbIndex, Disk, IndexConfig, LeveledIndex, MemoryModel, Operation, SimError, Workload};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn flash_index() -> Box<dyn DbIndex> {
    let disk = Disk::new(MemoryModel::flash()).unwrap();
    Box::new(LeveledIndex::new(IndexConfig::lsm(), disk))
}

fn mixed_workload() -> Workload {
    Workload::new()
        .push(Operation::SeedTopology(20_000))
        .push(Operation::Insert(5_000))
        .push(Operation::Bulkload(30_000))
        .push(Operation::Delete(1_000))
        .push(Operation::FindPoint { queries: 10 })
        .push(Operation::FindPointSelectivity {
            selectivity: 0.001,
            queries: 5,
        })
        .push(Operation::FindRange {
            queries: 3,
            len: 2_000,
        })
        .push(Operation::FindRangeSelectivity {
            selectivity: 0.05,
            queries: 2,
        })
}

// =============================================================================
// Operation Tests
// =============================================================================

#[test]
fn test_operations_match_direct_calls() {
    let mut replayed = flash_index();
    let mut direct = replayed.clone_empty();

    let times = mixed_workload().run(replayed.as_mut());

    direct.seed_topology(20_000);
    let expected = vec![
        0.0,
        direct.insert(5_000),
        direct.bulkload(30_000),
        direct.delete(1_000),
        direct.find_point(10),
        direct.find_point_selectivity(0.001, 5),
        direct.find_range(3, 2_000),
        direct.find_range_selectivity(0.05, 2),
    ];

    assert_eq!(times, expected);
    assert_eq!(replayed.entry_count(), direct.entry_count());
    assert_eq!(replayed.entry_count(), 54_000);
}

#[test]
fn test_seed_step_reports_zero() {
    let mut index = flash_index();

    let elapsed = Operation::SeedTopology(1_000_000).apply(index.as_mut());

    assert_eq!(elapsed, 0.0);
    assert_eq!(index.entry_count(), 1_000_000);
}

#[test]
fn test_operation_labels() {
    assert_eq!(Operation::Insert(10).label(), "insert 10");
    assert_eq!(Operation::FindPoint { queries: 3 }.label(), "point x3");
    assert_eq!(
        Operation::FindRange {
            queries: 2,
            len: 50
        }
        .label(),
        "range 50 x2"
    );
    assert_eq!(
        Operation::FindRangeSelectivity {
            selectivity: 0.01,
            queries: 1
        }
        .label(),
        "range 0.0100 x1"
    );
}

// =============================================================================
// Workload Tests
// =============================================================================

#[test]
fn test_workload_collects_from_iterator() {
    let workload: Workload = (1..=3).map(Operation::Insert).collect();

    assert_eq!(workload.len(), 3);
    assert!(!workload.is_empty());
    assert_eq!(workload.operations()[2], Operation::Insert(3));
    assert!(Workload::new().is_empty());
}

#[test]
fn test_empty_workload_runs_nothing() {
    let mut index = flash_index();

    assert!(Workload::new().run(index.as_mut()).is_empty());
    assert_eq!(index.entry_count(), 0);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_save_and_load_preserve_workload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mixed.workload");
    let workload = mixed_workload();

    workload.save(&path).unwrap();
    let loaded = Workload::load(&path).unwrap();

    assert_eq!(loaded, workload);

    // A replayed file gives the same timings as the original
    let original_times = workload.run(flash_index().as_mut());
    let loaded_times = loaded.run(flash_index().as_mut());
    assert_eq!(original_times, loaded_times);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();

    let result = Workload::load(&temp_dir.path().join("absent.workload"));

    assert!(matches!(result, Err(SimError::Io(_))));
}

#[test]
fn test_load_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("corrupt.workload");
    fs::write(&path, [0xFFu8; 3]).unwrap();

    let result = Workload::load(&path);

    assert!(matches!(result, Err(SimError::Serialization(_))));
}
