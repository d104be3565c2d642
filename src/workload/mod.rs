//! Workload Module
//!
//! Operation sequences and the runner that replays them.
//!
//! ## Responsibilities
//! - Describe a workload as a serializable list of operations
//! - Save/load workloads (bincode) so comparisons replay identical input
//! - Run one workload against many indexes, each on its own cloned disk

mod operation;
mod runner;

pub use operation::{Operation, Workload};
pub use runner::{RunReport, Runner};
