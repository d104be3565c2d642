//! Tests for MemoryModel and MemoryController
//!
//! These tests verify:
//! - Per-page read charging with no cross-call cache
//! - Write queuing and sequential/random program rates at flush
//! - Erase amortization with remainder carry
//! - Read-modify-write charging of overwrites
//! - Immediate charging on byte-addressable media
//! - Wear-out and counter accounting

use cascadesim::storage::{DeviceCounter, MediaKind, MemoryController, MemoryModel};
use cascadesim::SimError;

// =============================================================================
// Helper Functions
// =============================================================================

const PAGE: u64 = 8192;
const READ: f64 = 21e-6;
const WRITE: f64 = 45e-6;
const SEQ_WRITE: f64 = 15.3e-6;
const ERASE: f64 = 210.0 * 64e-6;

fn flash_controller() -> MemoryController {
    MemoryController::new(MemoryModel::flash()).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {}, got {}",
        expected,
        actual
    );
}

// =============================================================================
// Model Tests
// =============================================================================

#[test]
fn test_flash_preset_constants() {
    let model = MemoryModel::flash();

    assert_eq!(model.page_size, 8192);
    assert_eq!(model.pages_per_block, 32);
    assert_eq!(model.block_size(), 8192 * 32);
    assert_eq!(model.media, MediaKind::PageProgrammable);
    assert_close(model.erase_time, ERASE);
}

#[test]
fn test_touched_pages() {
    let model = MemoryModel::flash();

    assert_eq!(model.touched_pages(0, 0), 0);
    assert_eq!(model.touched_pages(0, 1), 1);
    assert_eq!(model.touched_pages(0, PAGE), 1);
    assert_eq!(model.touched_pages(0, PAGE + 1), 2);
    assert_eq!(model.touched_pages(PAGE - 1, 2), 2);
    assert_eq!(model.touched_pages(100, 200), 1);
}

#[test]
fn test_page_arithmetic_saturates() {
    let model = MemoryModel::flash();

    assert_eq!(model.page_align(u64::MAX), u64::MAX);
    assert_eq!(model.page_align(PAGE + 1), 2 * PAGE);
    assert_eq!(model.touched_pages(u64::MAX - 10, 100), 1);
}

#[test]
fn test_writes_near_address_limit() {
    let mut controller = flash_controller();

    controller.write_bytes(u64::MAX - PAGE, u64::MAX);
    let elapsed = controller.flush_cache();
    let overwrite = controller.overwrite_bytes(u64::MAX - 10, 100);

    assert!(elapsed.is_finite() && elapsed > 0.0);
    assert!(overwrite.is_finite() && overwrite > 0.0);
    assert!(controller.wear_out() > 0);
}

#[test]
fn test_invalid_model_rejected() {
    let mut model = MemoryModel::flash();
    model.page_size = 0;
    assert!(matches!(MemoryController::new(model), Err(SimError::Config(_))));

    let mut model = MemoryModel::flash();
    model.read_time = -1.0;
    assert!(matches!(MemoryController::new(model), Err(SimError::Config(_))));

    let mut model = MemoryModel::flash();
    model.erase_time = f64::NAN;
    assert!(matches!(MemoryController::new(model), Err(SimError::Config(_))));
}

#[test]
fn test_presets_by_name() {
    assert_eq!(MemoryModel::preset("flash"), Some(MemoryModel::flash()));
    assert_eq!(MemoryModel::preset("SSD"), Some(MemoryModel::ssd()));
    assert_eq!(MemoryModel::preset("pcm"), Some(MemoryModel::pcm()));
    assert_eq!(MemoryModel::preset("tape"), None);
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_zero_length_read_is_free() {
    let mut controller = flash_controller();

    assert_eq!(controller.read_bytes(1234, 0), 0.0);
    assert_eq!(controller.counters().count(DeviceCounter::Reads), 0);
}

#[test]
fn test_read_charges_each_touched_page_once() {
    let mut controller = flash_controller();

    assert_close(controller.read_bytes(0, PAGE), READ);
    assert_close(controller.read_bytes(8000, 400), 2.0 * READ);
    assert_close(controller.read_bytes(0, 10 * PAGE), 10.0 * READ);
}

#[test]
fn test_reads_are_not_cached_across_calls() {
    let mut controller = flash_controller();

    let first = controller.read_bytes(0, 100);
    let second = controller.read_bytes(0, 100);

    assert_eq!(first, second);
    assert_eq!(controller.counters().count(DeviceCounter::PagesRead), 2);
    assert_eq!(controller.counters().count(DeviceCounter::BytesRead), 200);
}

// =============================================================================
// Write and Flush Tests
// =============================================================================

#[test]
fn test_write_is_queued_until_flush() {
    let mut controller = flash_controller();

    assert_eq!(controller.write_bytes(0, 2 * PAGE), 0.0);
    assert_eq!(controller.pending_pages(), 2);
    assert_eq!(controller.wear_out(), 0);

    assert_close(controller.flush_cache(), 2.0 * WRITE);
    assert_eq!(controller.pending_pages(), 0);
    assert_eq!(controller.wear_out(), 2 * PAGE);
}

#[test]
fn test_sequential_rate_applies_from_threshold() {
    let mut controller = flash_controller();

    controller.write_bytes(0, 3 * PAGE);
    assert_close(controller.flush_cache(), 3.0 * WRITE);

    controller.write_bytes(0, 4 * PAGE);
    assert_close(controller.flush_cache(), 4.0 * SEQ_WRITE);
}

#[test]
fn test_flush_with_nothing_pending_is_free() {
    let mut controller = flash_controller();

    assert_eq!(controller.flush_cache(), 0.0);
    assert_eq!(controller.counters().count(DeviceCounter::Flushes), 0);
}

#[test]
fn test_erase_carries_remainder() {
    let mut controller = flash_controller();

    // 40 pages: one block erased, 8 pages carried
    controller.write_bytes(0, 40 * PAGE);
    assert_close(controller.flush_cache(), 40.0 * SEQ_WRITE + ERASE);
    assert_eq!(controller.dirty_pages(), 8);

    // 24 more pages complete the next block exactly
    controller.write_bytes(0, 24 * PAGE);
    assert_close(controller.flush_cache(), 24.0 * SEQ_WRITE + ERASE);
    assert_eq!(controller.dirty_pages(), 0);
    assert_eq!(controller.counters().count(DeviceCounter::Erases), 2);
}

#[test]
fn test_small_flushes_accumulate_toward_erase() {
    let mut controller = flash_controller();

    for _ in 0..31 {
        controller.write_bytes(0, 1);
        assert_close(controller.flush_cache(), WRITE);
    }
    controller.write_bytes(0, 1);
    assert_close(controller.flush_cache(), WRITE + ERASE);
    assert_eq!(controller.dirty_pages(), 0);
}

// =============================================================================
// Overwrite Tests
// =============================================================================

#[test]
fn test_overwrite_of_whole_pages_needs_no_read() {
    let mut controller = flash_controller();

    assert_eq!(controller.overwrite_bytes(0, 2 * PAGE), 0.0);
    // In-place programs are charged at the random rate even for long runs
    controller.overwrite_bytes(0, 8 * PAGE);
    assert_close(controller.flush_cache(), 10.0 * WRITE);
}

#[test]
fn test_overwrite_reads_partial_pages_first() {
    let mut controller = flash_controller();

    assert_close(controller.overwrite_bytes(100, 100), READ);
    assert_close(controller.overwrite_bytes(100, PAGE), 2.0 * READ);
    assert_close(controller.overwrite_bytes(0, PAGE + 1), READ);

    assert_eq!(controller.counters().count(DeviceCounter::Overwrites), 3);
    assert_eq!(controller.counters().count(DeviceCounter::PagesRead), 4);
}

// =============================================================================
// Byte-Addressable Media Tests
// =============================================================================

#[test]
fn test_pcm_charges_writes_immediately() {
    let mut controller = MemoryController::new(MemoryModel::pcm()).unwrap();

    assert_close(controller.write_bytes(0, 128), 2.0 * 1e-6);
    assert_eq!(controller.wear_out(), 128);
    assert_eq!(controller.flush_cache(), 0.0);
    assert_eq!(controller.counters().count(DeviceCounter::Erases), 0);
}

#[test]
fn test_pcm_overwrite_has_no_read_phase() {
    let mut controller = MemoryController::new(MemoryModel::pcm()).unwrap();

    assert_close(controller.overwrite_bytes(10, 20), 1e-6);
    assert_eq!(controller.counters().count(DeviceCounter::PagesRead), 0);
}

// =============================================================================
// Counter and Wear-out Tests
// =============================================================================

#[test]
fn test_device_counters_track_requests() {
    let mut controller = flash_controller();

    controller.read_bytes(0, PAGE);
    controller.read_bytes(0, 3 * PAGE);
    controller.write_bytes(0, 4 * PAGE);
    controller.flush_cache();

    let counters = controller.counters();
    assert_eq!(counters.count(DeviceCounter::Reads), 2);
    assert_eq!(counters.count(DeviceCounter::PagesRead), 4);
    assert_eq!(counters.count(DeviceCounter::Writes), 1);
    assert_eq!(counters.count(DeviceCounter::PagesProgrammed), 4);
    assert_close(counters.time(DeviceCounter::AverageReadTime), 2.0 * READ);
    assert_close(
        counters.time(DeviceCounter::TotalTime),
        4.0 * READ + 4.0 * SEQ_WRITE,
    );
    assert_eq!(controller.counter(DeviceCounter::Reads).0, "reads");
}

#[test]
fn test_reset_keeps_wear_out() {
    let mut controller = flash_controller();
    controller.write_bytes(0, PAGE);
    controller.flush_cache();

    controller.reset_all_counters();

    assert_eq!(controller.counters().time(DeviceCounter::TotalTime), 0.0);
    assert_eq!(controller.wear_out(), PAGE);
}

#[test]
fn test_clone_empty_has_fresh_state() {
    let mut controller = flash_controller();
    controller.write_bytes(0, 40 * PAGE);
    controller.flush_cache();
    controller.write_bytes(0, PAGE);

    let fresh = controller.clone_empty();

    assert_eq!(fresh.model(), controller.model());
    assert_eq!(fresh.wear_out(), 0);
    assert_eq!(fresh.dirty_pages(), 0);
    assert_eq!(fresh.pending_pages(), 0);
}
