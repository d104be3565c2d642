//! Memory Controller
//!
//! Stateful cost accountant over a [`MemoryModel`].
//!
//! ## Responsibilities
//! - Charge reads per page touched
//! - Queue page writes until `flush_cache()` (page-programmable media)
//! - Amortize block erases over programmed pages
//! - Accumulate wear-out and named counters

use tracing::trace;

use crate::counters::{CounterId, CounterKind, CounterValue, Counters};
use crate::error::Result;

use super::model::{MediaKind, MemoryModel};

/// Counters kept by every [`MemoryController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCounter {
    ReadTime,
    WriteTime,
    OverwriteTime,
    EraseTime,
    Reads,
    Writes,
    Overwrites,
    Flushes,
    Erases,
    BytesRead,
    BytesWritten,
    BytesOverwritten,
    PagesRead,
    PagesProgrammed,
    AverageReadTime,
    AverageWriteTime,
    TotalTime,
}

impl CounterId for DeviceCounter {
    const ALL: &'static [Self] = &[
        DeviceCounter::ReadTime,
        DeviceCounter::WriteTime,
        DeviceCounter::OverwriteTime,
        DeviceCounter::EraseTime,
        DeviceCounter::Reads,
        DeviceCounter::Writes,
        DeviceCounter::Overwrites,
        DeviceCounter::Flushes,
        DeviceCounter::Erases,
        DeviceCounter::BytesRead,
        DeviceCounter::BytesWritten,
        DeviceCounter::BytesOverwritten,
        DeviceCounter::PagesRead,
        DeviceCounter::PagesProgrammed,
        DeviceCounter::AverageReadTime,
        DeviceCounter::AverageWriteTime,
        DeviceCounter::TotalTime,
    ];

    fn name(self) -> &'static str {
        match self {
            DeviceCounter::ReadTime => "read time",
            DeviceCounter::WriteTime => "write time",
            DeviceCounter::OverwriteTime => "overwrite time",
            DeviceCounter::EraseTime => "erase time",
            DeviceCounter::Reads => "reads",
            DeviceCounter::Writes => "writes",
            DeviceCounter::Overwrites => "overwrites",
            DeviceCounter::Flushes => "flushes",
            DeviceCounter::Erases => "erases",
            DeviceCounter::BytesRead => "bytes read",
            DeviceCounter::BytesWritten => "bytes written",
            DeviceCounter::BytesOverwritten => "bytes overwritten",
            DeviceCounter::PagesRead => "pages read",
            DeviceCounter::PagesProgrammed => "pages programmed",
            DeviceCounter::AverageReadTime => "average read time",
            DeviceCounter::AverageWriteTime => "average write time",
            DeviceCounter::TotalTime => "total device time",
        }
    }

    fn kind(self) -> CounterKind<Self> {
        use DeviceCounter::*;
        match self {
            ReadTime | WriteTime | OverwriteTime | EraseTime => CounterKind::Time,
            AverageReadTime => CounterKind::Average {
                time: ReadTime,
                ops: Reads,
            },
            AverageWriteTime => CounterKind::Average {
                time: WriteTime,
                ops: Writes,
            },
            TotalTime => CounterKind::Total(&[ReadTime, WriteTime, OverwriteTime, EraseTime]),
            _ => CounterKind::Count,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A contiguous run of pages queued by one write call
#[derive(Debug, Clone, Copy)]
struct PageRun {
    pages: u64,
}

/// Applies device timing to byte-range requests
#[derive(Debug)]
pub struct MemoryController {
    model: MemoryModel,

    /// Runs queued by `write_bytes`, programmed at flush
    pending_writes: Vec<PageRun>,

    /// Runs queued by `overwrite_bytes`, programmed at flush
    pending_overwrites: Vec<PageRun>,

    /// Pages programmed since the last erase (carries the remainder)
    dirty_pages: u64,

    /// Bytes physically programmed over the controller's lifetime
    wear_out: u64,

    counters: Counters<DeviceCounter>,
}

impl MemoryController {
    /// Create a controller with empty queues over a validated model
    pub fn new(model: MemoryModel) -> Result<Self> {
        model.validate()?;

        Ok(Self {
            model,
            pending_writes: Vec::new(),
            pending_overwrites: Vec::new(),
            dirty_pages: 0,
            wear_out: 0,
            counters: Counters::new(),
        })
    }

    /// A controller over the same (already validated) model with fresh state
    pub fn clone_empty(&self) -> Self {
        Self {
            model: self.model.clone(),
            pending_writes: Vec::new(),
            pending_overwrites: Vec::new(),
            dirty_pages: 0,
            wear_out: 0,
            counters: Counters::new(),
        }
    }

    /// Read `len` bytes at `address`; each touched page is charged once
    pub fn read_bytes(&mut self, address: u64, len: u64) -> f64 {
        if len == 0 {
            return 0.0;
        }

        let pages = self.model.touched_pages(address, len);
        let elapsed = pages as f64 * self.model.read_time;

        self.counters.add_time(DeviceCounter::ReadTime, elapsed);
        self.counters.add_count(DeviceCounter::Reads, 1);
        self.counters.add_count(DeviceCounter::BytesRead, len);
        self.counters.add_count(DeviceCounter::PagesRead, pages);

        trace!(address, len, pages, elapsed, "read");
        elapsed
    }

    /// Write `len` bytes at `address`
    ///
    /// Page-programmable media queue the pages and return 0; the program
    /// time is charged by the next `flush_cache()`. Byte-addressable media
    /// are charged immediately.
    pub fn write_bytes(&mut self, address: u64, len: u64) -> f64 {
        if len == 0 {
            return 0.0;
        }

        let pages = self.model.touched_pages(address, len);
        self.counters.add_count(DeviceCounter::Writes, 1);
        self.counters.add_count(DeviceCounter::BytesWritten, len);

        match self.model.media {
            MediaKind::PageProgrammable => {
                self.pending_writes.push(PageRun { pages });
                0.0
            }
            MediaKind::ByteAddressable => {
                let elapsed = self.write_in_place(pages, len);
                self.counters.add_time(DeviceCounter::WriteTime, elapsed);
                elapsed
            }
        }
    }

    /// Modify `len` bytes in place at `address`
    ///
    /// On page-programmable media a partially covered page must be read
    /// before it can be reprogrammed; that read is charged now and the
    /// program time at the next flush.
    pub fn overwrite_bytes(&mut self, address: u64, len: u64) -> f64 {
        if len == 0 {
            return 0.0;
        }

        let pages = self.model.touched_pages(address, len);
        self.counters.add_count(DeviceCounter::Overwrites, 1);
        self.counters.add_count(DeviceCounter::BytesOverwritten, len);

        match self.model.media {
            MediaKind::PageProgrammable => {
                let partial = self.partial_pages(address, len);
                let elapsed = partial as f64 * self.model.read_time;
                if partial > 0 {
                    self.counters.add_time(DeviceCounter::ReadTime, elapsed);
                    self.counters.add_count(DeviceCounter::Reads, 1);
                    self.counters.add_count(DeviceCounter::PagesRead, partial);
                }
                self.pending_overwrites.push(PageRun { pages });
                elapsed
            }
            MediaKind::ByteAddressable => {
                let elapsed = self.write_in_place(pages, len);
                self.counters.add_time(DeviceCounter::OverwriteTime, elapsed);
                elapsed
            }
        }
    }

    /// Program every queued page and charge the erases they amortize
    pub fn flush_cache(&mut self) -> f64 {
        if self.pending_writes.is_empty() && self.pending_overwrites.is_empty() {
            return 0.0;
        }

        let mut write_time = 0.0;
        for run in std::mem::take(&mut self.pending_writes) {
            let per_page = if run.pages >= self.model.sequential_threshold {
                self.model.sequential_write_time
            } else {
                self.model.write_time
            };
            write_time += run.pages as f64 * per_page;
            self.program(run.pages);
        }

        let mut overwrite_time = 0.0;
        for run in std::mem::take(&mut self.pending_overwrites) {
            overwrite_time += run.pages as f64 * self.model.write_time;
            self.program(run.pages);
        }

        let erase_time = self.erase_dirty_blocks();

        self.counters.add_time(DeviceCounter::WriteTime, write_time);
        self.counters.add_time(DeviceCounter::OverwriteTime, overwrite_time);
        self.counters.add_count(DeviceCounter::Flushes, 1);

        let elapsed = write_time + overwrite_time + erase_time;
        trace!(write_time, overwrite_time, erase_time, "flush");
        elapsed
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The device constants
    pub fn model(&self) -> &MemoryModel {
        &self.model
    }

    /// Bytes physically programmed so far; never decreases
    pub fn wear_out(&self) -> u64 {
        self.wear_out
    }

    /// Pages programmed since the last erase
    pub fn dirty_pages(&self) -> u64 {
        self.dirty_pages
    }

    /// Pages waiting for the next flush
    pub fn pending_pages(&self) -> u64 {
        self.pending_writes
            .iter()
            .chain(self.pending_overwrites.iter())
            .map(|run| run.pages)
            .sum()
    }

    /// Read a counter as `(name, value)`
    pub fn counter(&self, id: DeviceCounter) -> (&'static str, CounterValue) {
        self.counters.get(id)
    }

    /// The full counter registry
    pub fn counters(&self) -> &Counters<DeviceCounter> {
        &self.counters
    }

    /// Reset one counter (wear-out is not a counter and is kept)
    pub fn reset_counter(&mut self, id: DeviceCounter) {
        self.counters.reset(id);
    }

    /// Reset every counter (wear-out is kept)
    pub fn reset_all_counters(&mut self) {
        self.counters.reset_all();
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Account programmed pages toward wear-out and the erase threshold
    fn program(&mut self, pages: u64) {
        self.wear_out = self
            .wear_out
            .saturating_add(pages.saturating_mul(self.model.page_size));
        self.dirty_pages = self.dirty_pages.saturating_add(pages);
        self.counters.add_count(DeviceCounter::PagesProgrammed, pages);
    }

    /// Charge one erase per full block of dirty pages, keeping the remainder
    fn erase_dirty_blocks(&mut self) -> f64 {
        let blocks = self.dirty_pages / self.model.pages_per_block;
        if blocks == 0 {
            return 0.0;
        }

        self.dirty_pages -= blocks * self.model.pages_per_block;
        let elapsed = blocks as f64 * self.model.erase_time;

        self.counters.add_time(DeviceCounter::EraseTime, elapsed);
        self.counters.add_count(DeviceCounter::Erases, blocks);
        elapsed
    }

    /// Immediate write on byte-addressable media
    fn write_in_place(&mut self, pages: u64, len: u64) -> f64 {
        self.wear_out = self.wear_out.saturating_add(len);
        self.counters.add_count(DeviceCounter::PagesProgrammed, pages);
        pages as f64 * self.model.write_time
    }

    /// Pages of a range that are only partly covered (0, 1 or 2)
    fn partial_pages(&self, address: u64, len: u64) -> u64 {
        let page = self.model.page_size;
        let end = address.saturating_add(len);
        let first = address / page;
        let last = (end - 1) / page;

        let head_partial = address % page != 0 || (first == last && end % page != 0);
        let tail_partial = last != first && end % page != 0;

        u64::from(head_partial) + u64::from(tail_partial)
    }
}
