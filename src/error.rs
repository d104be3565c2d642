//! Error types for cascadesim
//!
//! Simulated operations never fail; these errors cover construction-time
//! validation, workload files, and misuse that the engine contains locally.

use thiserror::Error;

/// Result type alias using SimError
pub type Result<T> = std::result::Result<T, SimError>;

/// Unified error type for cascadesim
#[derive(Debug, Error)]
pub enum SimError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Engine Misuse
    // -------------------------------------------------------------------------
    #[error("Placing {requested} entries at depth {depth} exceeds capacity ({available} free)")]
    Capacity {
        depth: usize,
        requested: u64,
        available: u64,
    },

    // -------------------------------------------------------------------------
    // Runner Errors
    // -------------------------------------------------------------------------
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<bincode::Error> for SimError {
    fn from(err: bincode::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}
