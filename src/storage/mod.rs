//! Storage Module
//!
//! Simulated storage media. No bytes are stored; every request is turned
//! into elapsed device time and wear.
//!
//! ## Layers
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Disk                                   │
//! │   address cursor (page-aligned regions)│
//! │ ┌────────────────────────────────────┐ │
//! │ │ MemoryController                   │ │
//! │ │   write / overwrite queues         │ │
//! │ │   dirty pages since last erase     │ │
//! │ │   wear-out, counters               │ │
//! │ │ ┌────────────────────────────────┐ │ │
//! │ │ │ MemoryModel (immutable)        │ │ │
//! │ │ │   page, block, read/write/erase│ │ │
//! │ │ └────────────────────────────────┘ │ │
//! │ └────────────────────────────────────┘ │
//! └────────────────────────────────────────┘
//! ```
//!
//! ## Timing Rules
//! - Reads are charged per page touched, once per call
//! - Page-programmable writes are queued and charged at `flush_cache()`
//! - Every full block of programmed pages costs one erase; the remainder
//!   carries over to the next flush

mod controller;
mod disk;
mod model;

pub use controller::{DeviceCounter, MemoryController};
pub use disk::Disk;
pub use model::{MediaKind, MemoryModel};
