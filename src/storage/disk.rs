//! Disk
//!
//! One simulated device: a memory controller plus an address cursor.

use crate::counters::{CounterValue, Counters};
use crate::error::Result;

use super::controller::{DeviceCounter, MemoryController};
use super::model::MemoryModel;

/// A simulated storage device owned by exactly one index
///
/// Regions are handed out by [`Disk::allocate`] from a monotonically
/// advancing cursor; nothing is ever freed and capacity is unbounded.
#[derive(Debug)]
pub struct Disk {
    controller: MemoryController,

    /// Next free logical address
    next_addr: u64,
}

impl Disk {
    /// Create a fresh disk over a device model
    pub fn new(model: MemoryModel) -> Result<Self> {
        Ok(Self {
            controller: MemoryController::new(model)?,
            next_addr: 0,
        })
    }

    /// An independent disk with the same model, fresh controller state and
    /// a reset cursor
    pub fn clone_empty(&self) -> Self {
        Self {
            controller: self.controller.clone_empty(),
            next_addr: 0,
        }
    }

    /// Reserve a page-aligned region of at least `bytes` and return its base
    pub fn allocate(&mut self, bytes: u64) -> u64 {
        let base = self.next_addr;
        self.next_addr = self
            .next_addr
            .saturating_add(self.controller.model().page_align(bytes));
        base
    }

    /// Next free logical address
    pub fn current_addr(&self) -> u64 {
        self.next_addr
    }

    pub fn read_bytes(&mut self, address: u64, len: u64) -> f64 {
        self.controller.read_bytes(address, len)
    }

    pub fn write_bytes(&mut self, address: u64, len: u64) -> f64 {
        self.controller.write_bytes(address, len)
    }

    pub fn overwrite_bytes(&mut self, address: u64, len: u64) -> f64 {
        self.controller.overwrite_bytes(address, len)
    }

    pub fn flush_cache(&mut self) -> f64 {
        self.controller.flush_cache()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn model(&self) -> &MemoryModel {
        self.controller.model()
    }

    pub fn controller(&self) -> &MemoryController {
        &self.controller
    }

    pub fn page_size(&self) -> u64 {
        self.controller.model().page_size
    }

    pub fn wear_out(&self) -> u64 {
        self.controller.wear_out()
    }

    pub fn counter(&self, id: DeviceCounter) -> (&'static str, CounterValue) {
        self.controller.counter(id)
    }

    pub fn counters(&self) -> &Counters<DeviceCounter> {
        self.controller.counters()
    }

    pub fn reset_counter(&mut self, id: DeviceCounter) {
        self.controller.reset_counter(id);
    }

    pub fn reset_all_counters(&mut self) {
        self.controller.reset_all_counters();
    }
}
