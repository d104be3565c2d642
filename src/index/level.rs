//! Levels
//!
//! A capacity-bounded tier of an index. The buffer tier and every
//! device-resident level share this type; only their handling differs.

use crate::error::{Result, SimError};

/// Addresses a tier inside one index
///
/// Levels are slots in the index's level vector, so a `TierId` stays valid
/// when deeper levels are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierId {
    /// The memory-resident buffer tier (depth 0)
    Buffer,

    /// Device level in slot `n` (depth `n + 1`)
    Level(usize),
}

/// How a merge step combines two tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Read both tiers and rewrite the target as one run
    Full,

    /// Write the source after the target's data as a new fragment
    Append,
}

/// Live and tombstone entry counts of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierCounts {
    pub live: u64,
    pub tombstones: u64,
}

impl TierCounts {
    pub fn new(live: u64, tombstones: u64) -> Self {
        Self { live, tombstones }
    }

    /// Entries taking up capacity
    pub fn occupied(&self) -> u64 {
        self.live + self.tombstones
    }
}

/// Counts left in `lower` after absorbing `upper`
///
/// Only counts are modeled, never keys. Tombstones of the newer tier cancel
/// in aggregate: in a full merge each one removes at most one live entry of
/// either tier, and tombstones that reach the deepest level have nothing
/// left to cancel and are dropped. An appended fragment is only compacted
/// against itself before it lands after the older runs.
pub fn merge_outcome(
    upper: TierCounts,
    lower: TierCounts,
    mode: MergeMode,
    lower_is_deepest: bool,
) -> TierCounts {
    match mode {
        MergeMode::Append => {
            let cancelled = upper.tombstones.min(upper.live);
            TierCounts::new(
                upper.live - cancelled + lower.live,
                upper.tombstones - cancelled + lower.tombstones,
            )
        }
        MergeMode::Full => {
            let cancelled = upper.tombstones.min(upper.live + lower.live);
            let live = upper.live + lower.live - cancelled;
            let tombstones = if lower_is_deepest {
                0
            } else {
                upper.tombstones - cancelled + lower.tombstones
            };
            TierCounts::new(live, tombstones)
        }
    }
}

/// One tier of a leveled index
#[derive(Debug, Clone)]
pub struct Level {
    /// Ordinal depth: 0 for the buffer tier, 1.. for device levels
    depth: usize,

    /// Byte capacity, fixed at creation
    capacity: u64,

    /// `capacity / record_size`
    max_entries: u64,

    live: u64,
    tombstones: u64,

    /// Unmerged runs currently stored in the tier
    fragments: u64,

    /// Base address of the data region
    base_addr: u64,

    /// Base address of the fence region (equal to `base_addr` without fences)
    fence_addr: u64,
}

impl Level {
    /// Create an empty tier
    pub fn new(depth: usize, capacity: u64, record_size: u64, base_addr: u64, fence_addr: u64) -> Self {
        Self {
            depth,
            capacity,
            max_entries: capacity / record_size.max(1),
            live: 0,
            tombstones: 0,
            fragments: 0,
            base_addr,
            fence_addr,
        }
    }

    // =========================================================================
    // Capacity Checks
    // =========================================================================

    /// live + tombstones has reached max
    pub fn is_full(&self) -> bool {
        self.occupied() >= self.max_entries
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    /// Entries that can still be added without reaching max
    pub fn room(&self) -> u64 {
        self.max_entries.saturating_sub(self.occupied() + 1)
    }

    /// Whether absorbing `upper` would leave this tier full
    pub fn will_be_full_after_merge(
        &self,
        upper: TierCounts,
        mode: MergeMode,
        is_deepest: bool,
    ) -> bool {
        merge_outcome(upper, self.counts(), mode, is_deepest).occupied() >= self.max_entries
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add buffered live entries; the tier may become full, never overfull
    pub fn add_live(&mut self, n: u64) {
        self.live += n;
        debug_assert!(self.occupied() <= self.max_entries);
    }

    /// Add buffered tombstones; the tier may become full, never overfull
    pub fn add_tombstones(&mut self, n: u64) {
        self.tombstones += n;
        debug_assert!(self.occupied() <= self.max_entries);
    }

    /// Place `n` live entries directly, as one new run
    ///
    /// Rejected when the tier would no longer be below max.
    pub fn append(&mut self, n: u64) -> Result<()> {
        if self.occupied().saturating_add(n) >= self.max_entries {
            return Err(SimError::Capacity {
                depth: self.depth,
                requested: n,
                available: self.room(),
            });
        }

        self.live += n;
        self.fragments += 1;
        Ok(())
    }

    /// Fast-forward: add live entries with no device activity
    pub fn seed(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        self.live += n;
        self.fragments = self.fragments.max(1);
        debug_assert!(self.occupied() < self.max_entries);
    }

    /// Overwrite the counts with a merge result
    pub fn set_counts(&mut self, counts: TierCounts, fragments: u64) {
        self.live = counts.live;
        self.tombstones = counts.tombstones;
        self.fragments = fragments;
        debug_assert!(self.occupied() < self.max_entries);
    }

    pub fn set_fragments(&mut self, fragments: u64) {
        self.fragments = fragments;
    }

    /// Drop every entry (the source side of a merge)
    pub fn clear(&mut self) {
        self.live = 0;
        self.tombstones = 0;
        self.fragments = 0;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    pub fn live(&self) -> u64 {
        self.live
    }

    pub fn tombstones(&self) -> u64 {
        self.tombstones
    }

    pub fn occupied(&self) -> u64 {
        self.live + self.tombstones
    }

    pub fn counts(&self) -> TierCounts {
        TierCounts::new(self.live, self.tombstones)
    }

    pub fn fragments(&self) -> u64 {
        self.fragments
    }

    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    pub fn fence_addr(&self) -> u64 {
        self.fence_addr
    }
}
