//! Configuration for cascadesim indexes
//!
//! One `IndexConfig` fully describes a merge-cascade variant. The named
//! structures are presets over the same fields.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::index::{BulkloadPolicy, Fences, Layout};

/// Configuration of one leveled merge-cascade index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Display name used in reports
    pub name: String,

    // -------------------------------------------------------------------------
    // Payload
    // -------------------------------------------------------------------------
    /// Row or columnar record layout
    pub layout: Layout,

    /// Per-tier fence pointers
    pub fences: Fences,

    // -------------------------------------------------------------------------
    // Merge Behavior
    // -------------------------------------------------------------------------
    /// Unmerged fragments a level may hold before it is fully merged
    /// (1 = classic leveling)
    pub fragment_budget: u64,

    /// Bulkload placement
    pub bulkload: BulkloadPolicy,

    // -------------------------------------------------------------------------
    // Sizing
    // -------------------------------------------------------------------------
    /// Capacity ratio between consecutive tiers
    pub growth_ratio: u64,

    /// Buffer tier capacity in bytes
    pub buffer_capacity: u64,
}

impl IndexConfig {
    pub const DEFAULT_KEY_SIZE: u64 = 8;
    pub const DEFAULT_VALUE_SIZE: u64 = 64;
    pub const DEFAULT_GROWTH_RATIO: u64 = 5;

    /// 1024 records of the default 72-byte row
    pub const DEFAULT_BUFFER_CAPACITY: u64 = 72 * 1024;

    /// Create a new config builder (starts from the row LSM preset)
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Row-oriented LSM-tree
    pub fn lsm() -> Self {
        Self {
            name: "LSM".to_string(),
            layout: Layout::Row {
                key_size: Self::DEFAULT_KEY_SIZE,
                value_size: Self::DEFAULT_VALUE_SIZE,
            },
            fences: Fences::None,
            fragment_budget: 1,
            bulkload: BulkloadPolicy::Direct {
                load_fraction_denominator: 1,
            },
            growth_ratio: Self::DEFAULT_GROWTH_RATIO,
            buffer_capacity: Self::DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// LSM-tree with one fence pointer per data page
    pub fn fence_pointer_lsm() -> Self {
        Self {
            name: "FP-LSM".to_string(),
            fences: Fences::PerPage,
            ..Self::lsm()
        }
    }

    /// Column-store LSM-tree; column 0 is the key
    pub fn columnar_lsm(widths: Vec<u64>) -> Self {
        Self {
            name: "Columnar LSM".to_string(),
            layout: Layout::Columnar { widths },
            fences: Fences::PerPage,
            bulkload: BulkloadPolicy::Direct {
                load_fraction_denominator: 2,
            },
            ..Self::lsm()
        }
    }

    /// Flash-aware LSM: fragments defer rewrites, bulk loads leave headroom
    pub fn flash_aware_lsm() -> Self {
        Self {
            name: "Flash-aware LSM".to_string(),
            fences: Fences::PerPage,
            fragment_budget: 4,
            bulkload: BulkloadPolicy::Direct {
                load_fraction_denominator: 2,
            },
            ..Self::lsm()
        }
    }

    /// Stepped-merge (tiered) LSM without bulkload support
    pub fn stepped_merge_lsm() -> Self {
        Self {
            name: "Stepped-merge LSM".to_string(),
            fragment_budget: 4,
            bulkload: BulkloadPolicy::Unsupported,
            ..Self::lsm()
        }
    }

    /// Default column widths for the columnar preset (same 72-byte record)
    pub fn default_columns() -> Vec<u64> {
        vec![8, 16, 16, 32]
    }

    /// Look up a preset by its short name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lsm" => Some(Self::lsm()),
            "fp" | "fence" | "fp-lsm" => Some(Self::fence_pointer_lsm()),
            "columnar" | "column" => Some(Self::columnar_lsm(Self::default_columns())),
            "flash" | "flash-aware" => Some(Self::flash_aware_lsm()),
            "stepped" | "stepped-merge" => Some(Self::stepped_merge_lsm()),
            _ => None,
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check the configuration describes a well-formed index
    pub fn validate(&self) -> Result<()> {
        if let Layout::Columnar { widths } = &self.layout {
            if widths.is_empty() {
                return Err(SimError::Config(
                    "columnar layout needs at least one column".to_string(),
                ));
            }
            if widths.contains(&0) {
                return Err(SimError::Config("column widths must be non-zero".to_string()));
            }
        }

        let record_size = self.layout.record_size();
        if record_size == 0 {
            return Err(SimError::Config("record size must be non-zero".to_string()));
        }
        if self.growth_ratio < 2 {
            return Err(SimError::Config(format!(
                "growth ratio must be at least 2, got {}",
                self.growth_ratio
            )));
        }
        if self.buffer_capacity / record_size < 1 {
            return Err(SimError::Config(format!(
                "buffer capacity {} holds no {}-byte record",
                self.buffer_capacity, record_size
            )));
        }
        if self.fragment_budget == 0 {
            return Err(SimError::Config(
                "fragment budget must be at least 1".to_string(),
            ));
        }
        if let BulkloadPolicy::Direct {
            load_fraction_denominator: 0,
        } = self.bulkload
        {
            return Err(SimError::Config(
                "load fraction denominator must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::lsm()
    }
}

/// Builder for IndexConfig
#[derive(Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Start from an existing configuration (e.g. a preset)
    pub fn from_config(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Use a row layout with the given key and value sizes (bytes)
    pub fn row(mut self, key_size: u64, value_size: u64) -> Self {
        self.config.layout = Layout::Row {
            key_size,
            value_size,
        };
        self
    }

    /// Use a columnar layout with the given column widths (bytes)
    pub fn columns(mut self, widths: Vec<u64>) -> Self {
        self.config.layout = Layout::Columnar { widths };
        self
    }

    /// Set the fence policy
    pub fn fences(mut self, fences: Fences) -> Self {
        self.config.fences = fences;
        self
    }

    /// Set the per-level fragment budget
    pub fn fragment_budget(mut self, budget: u64) -> Self {
        self.config.fragment_budget = budget;
        self
    }

    /// Set the bulkload policy
    pub fn bulkload(mut self, policy: BulkloadPolicy) -> Self {
        self.config.bulkload = policy;
        self
    }

    /// Set the capacity ratio between consecutive tiers
    pub fn growth_ratio(mut self, ratio: u64) -> Self {
        self.config.growth_ratio = ratio;
        self
    }

    /// Set the buffer tier capacity (in bytes)
    pub fn buffer_capacity(mut self, bytes: u64) -> Self {
        self.config.buffer_capacity = bytes;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<IndexConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
