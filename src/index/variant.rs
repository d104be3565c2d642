//! Variant axes
//!
//! The knobs that turn the one merge-cascade engine into each named index:
//! payload layout, fence pointers and bulkload placement. Each axis knows
//! the byte shapes it contributes to the engine's device requests.

use serde::{Deserialize, Serialize};

/// Bytes of the child pointer stored next to each fence key
pub const FENCE_POINTER_SIZE: u64 = 8;

/// How a record's bytes are laid out inside a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// Whole records stored contiguously
    Row { key_size: u64, value_size: u64 },

    /// One region per column; column 0 is the key
    Columnar { widths: Vec<u64> },
}

impl Layout {
    /// Bytes of one record across all columns
    pub fn record_size(&self) -> u64 {
        match self {
            Layout::Row {
                key_size,
                value_size,
            } => key_size + value_size,
            Layout::Columnar { widths } => widths.iter().sum(),
        }
    }

    pub fn key_size(&self) -> u64 {
        match self {
            Layout::Row { key_size, .. } => *key_size,
            Layout::Columnar { widths } => widths.first().copied().unwrap_or(0),
        }
    }

    /// Per-entry width of each region a tier is split into
    pub fn region_widths(&self) -> Vec<u64> {
        match self {
            Layout::Row { .. } => vec![self.record_size()],
            Layout::Columnar { widths } => widths.clone(),
        }
    }

    /// Per-entry width of the region that lookups search without fences
    pub fn key_region_width(&self) -> u64 {
        match self {
            Layout::Row { .. } => self.record_size(),
            Layout::Columnar { .. } => self.key_size(),
        }
    }

    /// Regions read by a fetch of the given columns
    ///
    /// Row layouts always fetch whole records. Unknown column indexes are
    /// ignored; `None` means every column.
    pub fn projected_regions(&self, columns: Option<&[usize]>) -> Vec<usize> {
        match (self, columns) {
            (Layout::Columnar { widths }, Some(columns)) => {
                let mut regions: Vec<usize> = columns
                    .iter()
                    .copied()
                    .filter(|c| *c < widths.len())
                    .collect();
                regions.sort_unstable();
                regions.dedup();
                regions
            }
            (Layout::Columnar { widths }, None) => (0..widths.len()).collect(),
            (Layout::Row { .. }, _) => vec![0],
        }
    }

    pub fn is_columnar(&self) -> bool {
        matches!(self, Layout::Columnar { .. })
    }
}

/// Auxiliary search structure kept per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fences {
    /// Lookups binary-search the key region itself
    None,

    /// One `key + pointer` entry per data page, in its own region
    PerPage,
}

impl Fences {
    /// Fence bytes indexing `key_region_bytes` of keys
    pub fn region_bytes(self, key_region_bytes: u64, key_size: u64, page_size: u64) -> u64 {
        match self {
            Fences::None => 0,
            Fences::PerPage => {
                key_region_bytes.div_ceil(page_size) * (key_size + FENCE_POINTER_SIZE)
            }
        }
    }
}

/// Whether and how an index accepts bulk loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkloadPolicy {
    /// Bulkload calls are rejected with a warning
    Unsupported,

    /// Entries are written straight into a level, bypassing the buffer.
    /// A level accepts at most `max / load_fraction_denominator` entries.
    Direct { load_fraction_denominator: u64 },
}

impl BulkloadPolicy {
    pub fn is_supported(self) -> bool {
        matches!(self, BulkloadPolicy::Direct { .. })
    }

    /// Entries a level of `max_entries` may take in one bulk placement
    pub fn load_limit(self, max_entries: u64) -> u64 {
        match self {
            BulkloadPolicy::Unsupported => 0,
            BulkloadPolicy::Direct {
                load_fraction_denominator,
            } => max_entries / load_fraction_denominator.max(1),
        }
    }
}
