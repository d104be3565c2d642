//! # cascadesim
//!
//! An analytic cost simulator for write-optimized indexes:
//! - Leveled merge-cascade engine (LSM-tree and its fence-pointer,
//!   columnar, flash-aware and stepped-merge variants)
//! - Simulated storage devices (NAND flash, SSD, PCM) with write queuing,
//!   erase amortization and wear-out accounting
//! - Workload replay across competing indexes on identical cloned devices
//!
//! No key or value bytes are stored; only sizes and counts are tracked and
//! every operation returns simulated elapsed time.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Runner (workload)                        │
//! │             (one worker per competing index)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  DbIndex / LeveledIndex                      │
//! │      buffer tier → level 1 → level 2 → ... (cascade)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ read / write / flush
//!          ┌────────────▼────────────┐
//!          │          Disk           │
//!          │  ┌───────────────────┐  │
//!          │  │ MemoryController  │  │
//!          │  │  ┌─────────────┐  │  │
//!          │  │  │ MemoryModel │  │  │
//!          │  │  └─────────────┘  │  │
//!          │  └───────────────────┘  │
//!          └─────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod counters;
pub mod storage;
pub mod index;
pub mod workload;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SimError};
pub use config::{IndexConfig, IndexConfigBuilder};
pub use counters::{CounterValue, Counters};
pub use index::{DbIndex, IndexCounter, LeveledIndex};
pub use storage::{DeviceCounter, Disk, MemoryModel};
pub use workload::{Operation, RunReport, Runner, Workload};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cascadesim
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
