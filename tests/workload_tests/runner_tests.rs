//! Tests for Runner and RunReport
//!
//! These tests verify:
//! - Reports come back in input order regardless of worker count
//! - Indexes run in isolation on their own disks
//! - Report fields summarize the run

use cascadesim::{
    DbIndex, Disk, IndexConfig, IndexCounter, LeveledIndex, MemoryModel, Operation, RunReport,
    Runner, Workload,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn presets() -> Vec<IndexConfig> {
    ["lsm", "fp", "columnar", "flash-aware", "stepped"]
        .iter()
        .map(|name| IndexConfig::preset(name).unwrap())
        .collect()
}

fn indexes_on(disk: &Disk, configs: Vec<IndexConfig>) -> Vec<Box<dyn DbIndex>> {
    configs
        .into_iter()
        .map(|config| Box::new(LeveledIndex::new(config, disk.clone_empty())) as Box<dyn DbIndex>)
        .collect()
}

fn workload() -> Workload {
    Workload::new()
        .push(Operation::Bulkload(20_000))
        .push(Operation::Insert(15_000))
        .push(Operation::Delete(2_000))
        .push(Operation::FindPoint { queries: 20 })
        .push(Operation::FindRangeSelectivity {
            selectivity: 0.01,
            queries: 4,
        })
}

fn flash_disk() -> Disk {
    Disk::new(MemoryModel::flash()).unwrap()
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_reports_in_input_order() {
    let disk = flash_disk();
    let configs = presets();
    let names: Vec<String> = configs.iter().map(|c| c.name.clone()).collect();

    let reports = Runner::new(3)
        .run(indexes_on(&disk, configs), &workload())
        .unwrap();

    let reported: Vec<String> = reports.iter().map(|r| r.index.clone()).collect();
    assert_eq!(reported, names);
}

#[test]
fn test_worker_count_does_not_change_results() {
    let disk = flash_disk();

    let serial = Runner::new(1)
        .run(indexes_on(&disk, presets()), &workload())
        .unwrap();
    let parallel = Runner::new(8)
        .run(indexes_on(&disk, presets()), &workload())
        .unwrap();

    assert_eq!(serial, parallel);
}

#[test]
fn test_no_indexes_gives_no_reports() {
    let reports = Runner::new(4).run(Vec::new(), &workload()).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn test_zero_workers_clamped() {
    assert_eq!(Runner::new(0).workers(), 1);
    assert!(Runner::default().workers() >= 1);
}

// =============================================================================
// Isolation Tests
// =============================================================================

#[test]
fn test_identical_indexes_report_identically() {
    let disk = flash_disk();
    let configs = vec![IndexConfig::lsm(); 4];

    let reports = Runner::new(4)
        .run(indexes_on(&disk, configs), &workload())
        .unwrap();

    for report in &reports[1..] {
        assert_eq!(report.elapsed.to_bits(), reports[0].elapsed.to_bits());
        assert_eq!(report.wear_out, reports[0].wear_out);
    }
}

#[test]
fn test_runner_matches_sequential_replay() {
    let disk = flash_disk();

    let reports = Runner::new(2)
        .run(indexes_on(&disk, vec![IndexConfig::fence_pointer_lsm()]), &workload())
        .unwrap();

    let mut index = LeveledIndex::new(IndexConfig::fence_pointer_lsm(), disk.clone_empty());
    let expected = RunReport::collect(&mut index, &workload());

    assert_eq!(reports, vec![expected]);
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_report_summarizes_run() {
    let mut index = LeveledIndex::new(IndexConfig::lsm(), flash_disk());

    let report = RunReport::collect(&mut index, &workload());

    assert_eq!(report.device, "NAND flash");
    assert_eq!(report.step_times.len(), 5);
    assert_eq!(report.elapsed, report.step_times.iter().sum::<f64>());
    assert_eq!(report.entries, 33_000);
    assert_eq!(report.depth, index.depth());
    assert_eq!(report.wear_out, index.disk().wear_out());

    let merges = report
        .index_counters
        .iter()
        .find(|r| r.name == "merges")
        .unwrap();
    assert_eq!(merges.value, index.counters().value(IndexCounter::Merges));
    assert!(report.device_counters.iter().any(|r| r.name == "erases"));
}

#[test]
fn test_unsupported_bulkload_shows_in_report() {
    let mut index = LeveledIndex::new(IndexConfig::stepped_merge_lsm(), flash_disk());

    let report = RunReport::collect(&mut index, &workload());

    assert_eq!(report.step_times[0], 0.0);
    assert_eq!(report.entries, 13_000);
}
