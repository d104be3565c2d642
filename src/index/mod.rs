//! Index Module
//!
//! The leveled merge-cascade engine and the contract every index exposes.
//!
//! ## Shape
//! ```text
//!   insert / delete            bulkload
//!        │                        │
//!        ▼                        │
//! ┌─────────────┐                 │
//! │ Buffer tier │ depth 0, memory │
//! └──────┬──────┘                 │
//!        │ merge on overflow      │
//!        ▼                        ▼
//! ┌─────────────┐  ┌──────────────────────┐
//! │  Level 1    │◄─┤ direct placement     │
//! └──────┬──────┘  └──────────────────────┘
//!        │ cascade (deepest overflow first)
//!        ▼
//! ┌─────────────┐
//! │  Level 2    │ capacity × growth ratio
//! └──────┬──────┘
//!        ▼
//!       ...
//! ```
//!
//! ## Variants
//! Every named structure is the same engine under an
//! [`IndexConfig`](crate::config::IndexConfig) preset, varying layout,
//! fences, fragment budget and bulkload policy.

mod engine;
mod level;
mod variant;

use crate::counters::{CounterId, CounterKind, CounterValue, Counters};
use crate::storage::Disk;

pub use engine::LeveledIndex;
pub use level::{merge_outcome, Level, MergeMode, TierCounts, TierId};
pub use variant::{BulkloadPolicy, Fences, Layout, FENCE_POINTER_SIZE};

/// Counters kept by every index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexCounter {
    InsertTime,
    DeleteTime,
    BulkloadTime,
    PointSearchTime,
    RangeSearchTime,
    MergeTime,
    Inserts,
    Deletes,
    Bulkloads,
    PointSearches,
    RangeSearches,
    Merges,
    LevelsCreated,
    AverageInsertTime,
    AverageDeleteTime,
    AverageBulkloadTime,
    AveragePointSearchTime,
    AverageRangeSearchTime,
    TotalTime,
}

impl CounterId for IndexCounter {
    const ALL: &'static [Self] = &[
        IndexCounter::InsertTime,
        IndexCounter::DeleteTime,
        IndexCounter::BulkloadTime,
        IndexCounter::PointSearchTime,
        IndexCounter::RangeSearchTime,
        IndexCounter::MergeTime,
        IndexCounter::Inserts,
        IndexCounter::Deletes,
        IndexCounter::Bulkloads,
        IndexCounter::PointSearches,
        IndexCounter::RangeSearches,
        IndexCounter::Merges,
        IndexCounter::LevelsCreated,
        IndexCounter::AverageInsertTime,
        IndexCounter::AverageDeleteTime,
        IndexCounter::AverageBulkloadTime,
        IndexCounter::AveragePointSearchTime,
        IndexCounter::AverageRangeSearchTime,
        IndexCounter::TotalTime,
    ];

    fn name(self) -> &'static str {
        match self {
            IndexCounter::InsertTime => "insert time",
            IndexCounter::DeleteTime => "delete time",
            IndexCounter::BulkloadTime => "bulkload time",
            IndexCounter::PointSearchTime => "point search time",
            IndexCounter::RangeSearchTime => "range search time",
            IndexCounter::MergeTime => "merge time",
            IndexCounter::Inserts => "inserted entries",
            IndexCounter::Deletes => "deleted entries",
            IndexCounter::Bulkloads => "bulkloaded entries",
            IndexCounter::PointSearches => "point searches",
            IndexCounter::RangeSearches => "range searches",
            IndexCounter::Merges => "merges",
            IndexCounter::LevelsCreated => "levels created",
            IndexCounter::AverageInsertTime => "average insert time",
            IndexCounter::AverageDeleteTime => "average delete time",
            IndexCounter::AverageBulkloadTime => "average bulkload time",
            IndexCounter::AveragePointSearchTime => "average point search time",
            IndexCounter::AverageRangeSearchTime => "average range search time",
            IndexCounter::TotalTime => "total time",
        }
    }

    fn kind(self) -> CounterKind<Self> {
        use IndexCounter::*;
        match self {
            InsertTime | DeleteTime | BulkloadTime | PointSearchTime | RangeSearchTime
            | MergeTime => CounterKind::Time,
            AverageInsertTime => CounterKind::Average {
                time: InsertTime,
                ops: Inserts,
            },
            AverageDeleteTime => CounterKind::Average {
                time: DeleteTime,
                ops: Deletes,
            },
            AverageBulkloadTime => CounterKind::Average {
                time: BulkloadTime,
                ops: Bulkloads,
            },
            AveragePointSearchTime => CounterKind::Average {
                time: PointSearchTime,
                ops: PointSearches,
            },
            AverageRangeSearchTime => CounterKind::Average {
                time: RangeSearchTime,
                ops: RangeSearches,
            },
            // Merge time is already part of the operation that triggered it
            TotalTime => CounterKind::Total(&[
                InsertTime,
                DeleteTime,
                BulkloadTime,
                PointSearchTime,
                RangeSearchTime,
            ]),
            _ => CounterKind::Count,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Capabilities every simulated index exposes
///
/// Every mutating or querying call returns the simulated elapsed time in
/// seconds. No call fails: misuse is logged and costs nothing.
pub trait DbIndex: Send {
    /// Display name
    fn name(&self) -> &str;

    /// Insert `n` entries
    fn insert(&mut self, n: u64) -> f64;

    /// Load `n` entries through the bulk path (if supported)
    fn bulkload(&mut self, n: u64) -> f64;

    /// Delete up to `n` entries; stops at zero live entries
    fn delete(&mut self, n: u64) -> f64;

    /// Run `queries` single-entry point lookups
    fn find_point(&mut self, queries: u64) -> f64;

    /// Run `queries` point lookups each matching `selectivity` of the entries
    fn find_point_selectivity(&mut self, selectivity: f64, queries: u64) -> f64;

    /// Run `queries` range lookups each returning `len` entries
    fn find_range(&mut self, queries: u64, len: u64) -> f64;

    /// Run `queries` range lookups each returning `selectivity` of the entries
    fn find_range_selectivity(&mut self, selectivity: f64, queries: u64) -> f64;

    /// Pre-size the index to hold `n` more entries without charging time
    fn seed_topology(&mut self, n: u64);

    fn is_bulkload_supported(&self) -> bool;

    /// Live entries
    fn entry_count(&self) -> u64;

    /// Number of device levels (0 when only the buffer tier exists)
    fn depth(&self) -> usize;

    fn key_size(&self) -> u64;

    fn record_size(&self) -> u64;

    fn counter(&self, id: IndexCounter) -> (&'static str, CounterValue);

    fn counters(&self) -> &Counters<IndexCounter>;

    fn reset_counter(&mut self, id: IndexCounter);

    fn reset_all_counters(&mut self);

    /// The simulated device this index runs on
    fn disk(&self) -> &Disk;

    /// A fresh, empty index with the same configuration on a cloned disk
    fn clone_empty(&self) -> Box<dyn DbIndex>;
}
