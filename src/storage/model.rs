//! Device models
//!
//! Immutable physical constants for one storage device.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// How the medium accepts writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Whole pages are programmed; writes are buffered and blocks erased
    PageProgrammable,

    /// Writes land in place and are charged immediately (no erase)
    ByteAddressable,
}

/// Physical constants of a storage device
///
/// All times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryModel {
    /// Display name ("NAND flash", "SSD", ...)
    pub name: String,

    /// Write behavior of the medium
    pub media: MediaKind,

    /// Page size in bytes
    pub page_size: u64,

    /// Pages per erase block
    pub pages_per_block: u64,

    /// Time to read one page
    pub read_time: f64,

    /// Time to program one page written at random
    pub write_time: f64,

    /// Time to program one page of a sequential run
    pub sequential_write_time: f64,

    /// Minimum run length (pages) that programs at the sequential rate
    pub sequential_threshold: u64,

    /// Time to erase one block
    pub erase_time: f64,
}

impl MemoryModel {
    /// Raw NAND flash: 8 KiB pages, 32 pages per block
    pub fn flash() -> Self {
        Self {
            name: "NAND flash".to_string(),
            media: MediaKind::PageProgrammable,
            page_size: 8192,
            pages_per_block: 32,
            read_time: 21e-6,
            write_time: 45e-6,
            sequential_write_time: 15.3e-6,
            sequential_threshold: 4,
            erase_time: 210.0 * 64e-6,
        }
    }

    /// Flash SSD behind a controller: larger blocks, faster erase
    pub fn ssd() -> Self {
        Self {
            name: "SSD".to_string(),
            media: MediaKind::PageProgrammable,
            page_size: 8192,
            pages_per_block: 64,
            read_time: 50e-6,
            write_time: 60e-6,
            sequential_write_time: 20e-6,
            sequential_threshold: 8,
            erase_time: 1.5e-3,
        }
    }

    /// Phase-change memory: byte-addressable, 64-byte lines, no erase
    pub fn pcm() -> Self {
        Self {
            name: "PCM".to_string(),
            media: MediaKind::ByteAddressable,
            page_size: 64,
            pages_per_block: 1,
            read_time: 50e-9,
            write_time: 1e-6,
            sequential_write_time: 1e-6,
            sequential_threshold: 1,
            erase_time: 0.0,
        }
    }

    /// Look up a preset by its short name (`flash`, `ssd`, `pcm`)
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "flash" | "nand" => Some(Self::flash()),
            "ssd" => Some(Self::ssd()),
            "pcm" => Some(Self::pcm()),
            _ => None,
        }
    }

    /// Erase block size in bytes
    pub fn block_size(&self) -> u64 {
        self.page_size * self.pages_per_block
    }

    /// Check the constants describe a usable device
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SimError::Config("page size must be non-zero".to_string()));
        }
        if self.pages_per_block == 0 {
            return Err(SimError::Config(
                "pages per block must be non-zero".to_string(),
            ));
        }

        let times = [
            ("read", self.read_time),
            ("write", self.write_time),
            ("sequential write", self.sequential_write_time),
            ("erase", self.erase_time),
        ];
        for (what, t) in times {
            if !t.is_finite() || t < 0.0 {
                return Err(SimError::Config(format!(
                    "{} time must be a non-negative number, got {}",
                    what, t
                )));
            }
        }

        Ok(())
    }

    /// Number of pages a byte range touches (0 for an empty range)
    pub fn touched_pages(&self, address: u64, len: u64) -> u64 {
        if len == 0 {
            return 0;
        }
        let first = address / self.page_size;
        let last = address.saturating_add(len - 1) / self.page_size;
        last - first + 1
    }

    /// Round a byte count up to whole pages (saturating at `u64::MAX`)
    pub fn page_align(&self, bytes: u64) -> u64 {
        bytes.div_ceil(self.page_size).saturating_mul(self.page_size)
    }
}
