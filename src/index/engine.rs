//! Leveled merge-cascade engine
//!
//! One engine realizes every named index variant. It owns a disk, a buffer
//! tier and a growing vector of levels, and turns each operation into the
//! sequence of device requests the structure would issue.
//!
//! ## Responsibilities
//! - Buffer inserts and tombstones in memory, merging on overflow
//! - Cascade merges depth-first, creating levels lazily
//! - Place bulk loads directly into levels
//! - Charge lookups across every tier
//! - Fast-forward topology without charging time

use tracing::{debug, error, trace, warn};

use crate::config::IndexConfig;
use crate::counters::{CounterValue, Counters};
use crate::storage::Disk;

use super::level::{merge_outcome, Level, MergeMode, TierCounts, TierId};
use super::variant::Fences;
use super::{DbIndex, IndexCounter};

/// A leveled merge-cascade index over a simulated disk
///
/// ## Topology
/// - `buffer`: memory-resident tier at depth 0, free to read and write
/// - `levels[slot]`: device tier at depth `slot + 1`, each `growth_ratio`
///   times larger than the one above
///
/// Tiers are addressed by [`TierId`] and re-borrowed after every step, so a
/// cascade that appends a level never leaves a stale handle behind.
pub struct LeveledIndex {
    config: IndexConfig,

    disk: Disk,

    /// Live entries across the whole index
    entries: u64,

    buffer: Level,

    levels: Vec<Level>,

    counters: Counters<IndexCounter>,
}

impl LeveledIndex {
    /// Create an empty index (only the buffer tier) on its own disk
    ///
    /// `config` is expected to be validated (see [`IndexConfig::validate`]).
    pub fn new(config: IndexConfig, mut disk: Disk) -> Self {
        let buffer = Self::allocate_tier(&config, &mut disk, 0, config.buffer_capacity);

        debug!(
            index = %config.name,
            device = %disk.model().name,
            buffer_entries = buffer.max_entries(),
            "index created"
        );

        Self {
            config,
            disk,
            entries: 0,
            buffer,
            levels: Vec::new(),
            counters: Counters::new(),
        }
    }

    // =========================================================================
    // Operations (inherent versions of the DbIndex surface)
    // =========================================================================

    /// Insert `n` entries through the buffer tier
    pub fn insert(&mut self, n: u64) -> f64 {
        self.entries = self.entries.saturating_add(n);
        let elapsed = self.ingest(n, false);

        self.counters.add_count(IndexCounter::Inserts, n);
        self.counters.add_time(IndexCounter::InsertTime, elapsed);
        elapsed
    }

    /// Delete up to `n` entries by buffering tombstones
    pub fn delete(&mut self, n: u64) -> f64 {
        let n = n.min(self.entries);
        self.entries -= n;
        let elapsed = self.ingest(n, true);

        self.counters.add_count(IndexCounter::Deletes, n);
        self.counters.add_time(IndexCounter::DeleteTime, elapsed);
        elapsed
    }

    /// Load `n` entries, bypassing the buffer tier when the volume warrants
    pub fn bulkload(&mut self, n: u64) -> f64 {
        if !self.config.bulkload.is_supported() {
            warn!(index = %self.config.name, n, "bulkload not supported, ignoring");
            return 0.0;
        }
        if n == 0 {
            return 0.0;
        }

        let before = self.entries;
        let elapsed = if n < self.buffer.max_entries() {
            self.entries = self.entries.saturating_add(n);
            self.ingest(n, false)
        } else {
            self.bulk_place(n)
        };

        self.counters
            .add_count(IndexCounter::Bulkloads, self.entries - before);
        self.counters.add_time(IndexCounter::BulkloadTime, elapsed);
        elapsed
    }

    /// `queries` lookups of a single entry
    pub fn find_point(&mut self, queries: u64) -> f64 {
        let elapsed = self.run_queries(queries, 1, None);

        self.counters.add_count(IndexCounter::PointSearches, queries);
        self.counters.add_time(IndexCounter::PointSearchTime, elapsed);
        elapsed
    }

    /// `queries` point lookups whose key matches `selectivity` of the entries
    pub fn find_point_selectivity(&mut self, selectivity: f64, queries: u64) -> f64 {
        let count = self.selected(selectivity);
        let elapsed = self.run_queries(queries, count, None);

        self.counters.add_count(IndexCounter::PointSearches, queries);
        self.counters.add_time(IndexCounter::PointSearchTime, elapsed);
        elapsed
    }

    /// `queries` range lookups of `len` entries each
    pub fn find_range(&mut self, queries: u64, len: u64) -> f64 {
        self.find_range_columns(queries, len, None)
    }

    /// `queries` range lookups each covering `selectivity` of the entries
    pub fn find_range_selectivity(&mut self, selectivity: f64, queries: u64) -> f64 {
        let len = self.selected(selectivity);
        self.find_range_columns(queries, len, None)
    }

    /// Range lookups fetching only some columns
    ///
    /// Columnar layouts read just the listed column regions; row layouts
    /// always read whole records. `None` fetches every column.
    pub fn find_range_columns(&mut self, queries: u64, len: u64, columns: Option<&[usize]>) -> f64 {
        let elapsed = self.run_queries(queries, len, columns);

        self.counters.add_count(IndexCounter::RangeSearches, queries);
        self.counters.add_time(IndexCounter::RangeSearchTime, elapsed);
        elapsed
    }

    /// Fast-forward the topology to hold `n` more entries
    ///
    /// Tiers are filled top-down, each to one below its maximum, creating
    /// levels as needed. No device request is issued and no time charged.
    pub fn seed_topology(&mut self, n: u64) {
        let mut remaining = n;

        let take = remaining.min(self.buffer.room());
        self.buffer.seed(take);
        remaining -= take;

        let mut slot = 0;
        while remaining > 0 {
            if slot == self.levels.len() {
                self.push_level();
            }
            let take = remaining.min(self.levels[slot].room());
            self.levels[slot].seed(take);
            remaining -= take;
            slot += 1;
        }

        self.entries = self.entries.saturating_add(n);
        debug!(index = %self.config.name, n, depth = self.depth(), "topology seeded");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn entry_count(&self) -> u64 {
        self.entries
    }

    /// Number of device levels
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn buffer(&self) -> &Level {
        &self.buffer
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Counts of each tier, buffer first
    pub fn tier_counts(&self) -> Vec<TierCounts> {
        std::iter::once(&self.buffer)
            .chain(self.levels.iter())
            .map(Level::counts)
            .collect()
    }

    pub fn tier(&self, id: TierId) -> &Level {
        match id {
            TierId::Buffer => &self.buffer,
            TierId::Level(slot) => &self.levels[slot],
        }
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    pub fn counters(&self) -> &Counters<IndexCounter> {
        &self.counters
    }

    // =========================================================================
    // Buffer Tier
    // =========================================================================

    /// Feed `n` units (live entries or tombstones) into the buffer tier,
    /// merging it out every time it fills
    fn ingest(&mut self, n: u64, tombstones: bool) -> f64 {
        let mut remaining = n;
        let mut elapsed = 0.0;

        while remaining > 0 {
            let space = self.buffer.max_entries() - self.buffer.occupied();
            let take = remaining.min(space);
            if tombstones {
                self.buffer.add_tombstones(take);
            } else {
                self.buffer.add_live(take);
            }
            remaining -= take;

            if self.buffer.is_full() {
                elapsed += self.merge_buffer_tier();
            }
        }

        elapsed
    }

    fn merge_buffer_tier(&mut self) -> f64 {
        if self.levels.is_empty() {
            self.push_level();
        }
        self.merge(TierId::Buffer, 0)
    }

    // =========================================================================
    // Merge Cascade
    // =========================================================================

    /// Merge `upper` into the level in slot `lower`
    ///
    /// If `lower` would overflow it is first merged one level deeper
    /// (recursively, creating levels as needed), so the deepest overflow is
    /// always resolved first. Each step flushes the device on its own.
    fn merge(&mut self, upper: TierId, lower: usize) -> f64 {
        let upper_counts = self.tier(upper).counts();
        let mut elapsed = 0.0;

        let mode = self.merge_mode(lower);
        let deepest = lower + 1 == self.levels.len();
        if self.levels[lower].will_be_full_after_merge(upper_counts, mode, deepest) {
            if deepest {
                self.push_level();
            }
            elapsed += self.merge(TierId::Level(lower), lower + 1);
        }

        // The cascade may have drained `lower` and appended a level
        let mode = self.merge_mode(lower);
        let deepest = lower + 1 == self.levels.len();
        let lower_counts = self.levels[lower].counts();
        let outcome = merge_outcome(upper_counts, lower_counts, mode, deepest);

        let mut step = self.read_entries(upper, 0, upper_counts.occupied(), None);
        let fragments = match mode {
            MergeMode::Full => {
                if upper != TierId::Buffer {
                    step += self.read_entries(TierId::Level(lower), 0, lower_counts.occupied(), None);
                }
                step += self.write_entries(lower, 0, outcome.occupied());
                u64::from(outcome.occupied() > 0)
            }
            MergeMode::Append => {
                let run = outcome.occupied() - lower_counts.occupied();
                step += self.write_entries(lower, lower_counts.occupied(), run);
                self.levels[lower].fragments() + u64::from(run > 0)
            }
        };
        step += self.disk.flush_cache();

        self.tier_mut(upper).clear();
        self.levels[lower].set_counts(outcome, fragments);

        self.counters.add_count(IndexCounter::Merges, 1);
        self.counters.add_time(IndexCounter::MergeTime, step);

        debug!(
            index = %self.config.name,
            from = self.tier(upper).depth(),
            into = lower + 1,
            ?mode,
            live = outcome.live,
            tombstones = outcome.tombstones,
            elapsed = step,
            "merge step"
        );

        elapsed + step
    }

    fn merge_mode(&self, lower: usize) -> MergeMode {
        let level = &self.levels[lower];
        if self.config.fragment_budget > 1
            && !level.is_empty()
            && level.fragments() < self.config.fragment_budget
        {
            MergeMode::Append
        } else {
            MergeMode::Full
        }
    }

    /// Append a level one growth step below the current deepest tier
    fn push_level(&mut self) -> usize {
        let above = self.levels.last().unwrap_or(&self.buffer).capacity();
        let capacity = above.saturating_mul(self.config.growth_ratio);
        let depth = self.levels.len() + 1;

        let level = Self::allocate_tier(&self.config, &mut self.disk, depth, capacity);
        debug!(
            index = %self.config.name,
            depth,
            capacity,
            max_entries = level.max_entries(),
            "level created"
        );

        self.levels.push(level);
        self.counters.add_count(IndexCounter::LevelsCreated, 1);
        self.levels.len() - 1
    }

    fn allocate_tier(config: &IndexConfig, disk: &mut Disk, depth: usize, capacity: u64) -> Level {
        let record_size = config.layout.record_size();
        let max_entries = capacity / record_size;

        let base_addr = disk.allocate(capacity);
        let fence_bytes = Self::fence_bytes_for(config, disk.page_size(), max_entries);
        let fence_addr = if fence_bytes > 0 {
            disk.allocate(fence_bytes)
        } else {
            base_addr
        };

        Level::new(depth, capacity, record_size, base_addr, fence_addr)
    }

    // =========================================================================
    // Bulkload
    // =========================================================================

    /// Place `n` (at least one buffer's worth) entries directly into levels
    fn bulk_place(&mut self, n: u64) -> f64 {
        let target = (0..self.levels.len()).find(|&slot| n < self.load_limit(slot));

        match target {
            Some(slot) => {
                let mut elapsed = 0.0;
                let level = &self.levels[slot];
                if level.occupied() + n >= level.max_entries() {
                    if slot + 1 == self.levels.len() {
                        self.push_level();
                    }
                    elapsed += self.merge(TierId::Level(slot), slot + 1);
                }
                elapsed + self.place(slot, n)
            }
            None => {
                let mut elapsed = 0.0;
                let mut remaining = n;
                while remaining > 0 {
                    let slot = self.push_level();
                    let fill = remaining.min(self.fill_limit(slot));
                    elapsed += self.place(slot, fill);
                    remaining -= fill;
                }
                elapsed
            }
        }
    }

    /// Write `n` entries after the current contents of level `slot`
    fn place(&mut self, slot: usize, n: u64) -> f64 {
        let offset = self.levels[slot].occupied();

        if let Err(err) = self.levels[slot].append(n) {
            error!(index = %self.config.name, %err, "direct placement rejected");
            return 0.0;
        }
        if self.config.fragment_budget == 1 {
            self.levels[slot].set_fragments(1);
        }
        self.entries = self.entries.saturating_add(n);

        let elapsed = self.write_entries(slot, offset, n) + self.disk.flush_cache();
        debug!(
            index = %self.config.name,
            depth = slot + 1,
            n,
            elapsed,
            "bulk placement"
        );
        elapsed
    }

    /// Entries a bulk placement may put into level `slot`
    fn load_limit(&self, slot: usize) -> u64 {
        self.config
            .bulkload
            .load_limit(self.levels[slot].max_entries())
    }

    /// Entries a freshly created level is filled with during bulkload
    fn fill_limit(&self, slot: usize) -> u64 {
        self.load_limit(slot).saturating_sub(1).max(1)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn run_queries(&mut self, queries: u64, count: u64, columns: Option<&[usize]>) -> f64 {
        let mut elapsed = 0.0;
        for _ in 0..queries {
            let search = self.search_levels();
            let payload = self.read_answer(count, columns);
            trace!(search, payload, "query");
            elapsed += search + payload;
        }
        elapsed
    }

    /// Search every tier from the buffer down; the buffer itself is free
    fn search_levels(&mut self) -> f64 {
        (0..self.levels.len()).map(|slot| self.search_level(slot)).sum()
    }

    /// Binary-search each fragment of level `slot`
    fn search_level(&mut self, slot: usize) -> f64 {
        let level = &self.levels[slot];
        if level.is_empty() {
            return 0.0;
        }

        let page_size = self.disk.page_size();
        let occupied = level.occupied();
        let (base, region_bytes) = match self.config.fences {
            Fences::PerPage => (level.fence_addr(), self.fence_bytes(occupied)),
            Fences::None => (
                level.base_addr(),
                occupied * self.config.layout.key_region_width(),
            ),
        };

        let fragments = level.fragments().max(1);
        let pages = region_bytes.div_ceil(page_size);
        let per_fragment = pages.div_ceil(fragments).max(1);

        let mut elapsed = 0.0;
        for fragment in 0..fragments {
            let start = base.saturating_add(fragment * per_fragment * page_size);
            elapsed += self.binary_search(start, per_fragment);
        }
        elapsed
    }

    /// Narrowing single-page reads over `pages` pages starting at `base`
    fn binary_search(&mut self, base: u64, pages: u64) -> f64 {
        let page_size = self.disk.page_size();
        let (mut lo, mut hi) = (0u64, pages);
        let mut elapsed = 0.0;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            elapsed += self
                .disk
                .read_bytes(base.saturating_add(mid * page_size), page_size);
            hi = mid;
        }
        elapsed
    }

    /// Payload read of `count` entries at the deepest non-empty level
    fn read_answer(&mut self, count: u64, columns: Option<&[usize]>) -> f64 {
        let count = count.min(self.entries);
        if count == 0 {
            return 0.0;
        }

        match self.levels.iter().rposition(|level| !level.is_empty()) {
            Some(slot) => {
                let count = count.min(self.levels[slot].max_entries());
                self.read_entries(TierId::Level(slot), 0, count, columns)
            }
            // Everything is still in the buffer tier
            None => 0.0,
        }
    }

    fn selected(&self, selectivity: f64) -> u64 {
        let fraction = if selectivity.is_nan() {
            0.0
        } else {
            selectivity.clamp(0.0, 1.0)
        };
        (fraction * self.entries as f64).ceil() as u64
    }

    // =========================================================================
    // Device Requests
    // =========================================================================

    /// Read entries `[offset, offset + count)` of a tier, per region
    fn read_entries(&mut self, id: TierId, offset: u64, count: u64, columns: Option<&[usize]>) -> f64 {
        if count == 0 {
            return 0.0;
        }

        let spans = self.region_spans(self.tier(id), offset, count, columns);
        spans
            .into_iter()
            .map(|(address, len)| self.disk.read_bytes(address, len))
            .sum()
    }

    /// Write entries `[offset, offset + count)` of level `slot` plus the
    /// fence entries covering them (flushing is left to the caller)
    fn write_entries(&mut self, slot: usize, offset: u64, count: u64) -> f64 {
        if count == 0 {
            return 0.0;
        }

        let level = &self.levels[slot];
        let mut spans = self.region_spans(level, offset, count, None);

        let fence_start = self.fence_bytes(offset);
        let fence_len = self.fence_bytes(offset + count) - fence_start;
        if fence_len > 0 {
            spans.push((level.fence_addr().saturating_add(fence_start), fence_len));
        }

        spans
            .into_iter()
            .map(|(address, len)| self.disk.write_bytes(address, len))
            .sum()
    }

    /// `(address, len)` of each region slice holding the given entries
    ///
    /// Region `r` of a tier starts at `base + max_entries × (widths before r)`.
    fn region_spans(
        &self,
        level: &Level,
        offset: u64,
        count: u64,
        columns: Option<&[usize]>,
    ) -> Vec<(u64, u64)> {
        let widths = self.config.layout.region_widths();
        self.config
            .layout
            .projected_regions(columns)
            .into_iter()
            .map(|region| {
                let before: u64 = widths[..region].iter().sum();
                let width = widths[region];
                let start = level
                    .base_addr()
                    .saturating_add(level.max_entries() * before + offset * width);
                (start, count * width)
            })
            .collect()
    }

    fn fence_bytes(&self, entries: u64) -> u64 {
        Self::fence_bytes_for(&self.config, self.disk.page_size(), entries)
    }

    fn fence_bytes_for(config: &IndexConfig, page_size: u64, entries: u64) -> u64 {
        config.fences.region_bytes(
            entries * config.layout.key_region_width(),
            config.layout.key_size(),
            page_size,
        )
    }

    fn tier_mut(&mut self, id: TierId) -> &mut Level {
        match id {
            TierId::Buffer => &mut self.buffer,
            TierId::Level(slot) => &mut self.levels[slot],
        }
    }
}

impl DbIndex for LeveledIndex {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn insert(&mut self, n: u64) -> f64 {
        LeveledIndex::insert(self, n)
    }

    fn bulkload(&mut self, n: u64) -> f64 {
        LeveledIndex::bulkload(self, n)
    }

    fn delete(&mut self, n: u64) -> f64 {
        LeveledIndex::delete(self, n)
    }

    fn find_point(&mut self, queries: u64) -> f64 {
        LeveledIndex::find_point(self, queries)
    }

    fn find_point_selectivity(&mut self, selectivity: f64, queries: u64) -> f64 {
        LeveledIndex::find_point_selectivity(self, selectivity, queries)
    }

    fn find_range(&mut self, queries: u64, len: u64) -> f64 {
        LeveledIndex::find_range(self, queries, len)
    }

    fn find_range_selectivity(&mut self, selectivity: f64, queries: u64) -> f64 {
        LeveledIndex::find_range_selectivity(self, selectivity, queries)
    }

    fn seed_topology(&mut self, n: u64) {
        LeveledIndex::seed_topology(self, n)
    }

    fn is_bulkload_supported(&self) -> bool {
        self.config.bulkload.is_supported()
    }

    fn entry_count(&self) -> u64 {
        self.entries
    }

    fn depth(&self) -> usize {
        self.levels.len()
    }

    fn key_size(&self) -> u64 {
        self.config.layout.key_size()
    }

    fn record_size(&self) -> u64 {
        self.config.layout.record_size()
    }

    fn counter(&self, id: IndexCounter) -> (&'static str, CounterValue) {
        self.counters.get(id)
    }

    fn counters(&self) -> &Counters<IndexCounter> {
        &self.counters
    }

    fn reset_counter(&mut self, id: IndexCounter) {
        self.counters.reset(id);
    }

    fn reset_all_counters(&mut self) {
        self.counters.reset_all();
    }

    fn disk(&self) -> &Disk {
        &self.disk
    }

    fn clone_empty(&self) -> Box<dyn DbIndex> {
        Box::new(LeveledIndex::new(self.config.clone(), self.disk.clone_empty()))
    }
}
