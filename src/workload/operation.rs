//! Workload operations
//!
//! A serializable operation sequence, replayable against any index.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::DbIndex;

/// One step of a workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert `n` entries
    Insert(u64),

    /// Bulk-load `n` entries
    Bulkload(u64),

    /// Delete `n` entries
    Delete(u64),

    /// Single-entry point lookups
    FindPoint { queries: u64 },

    /// Point lookups matching a fraction of the entries
    FindPointSelectivity { selectivity: f64, queries: u64 },

    /// Range lookups of `len` entries
    FindRange { queries: u64, len: u64 },

    /// Range lookups covering a fraction of the entries
    FindRangeSelectivity { selectivity: f64, queries: u64 },

    /// Untimed fast-forward to hold `n` more entries
    SeedTopology(u64),
}

impl Operation {
    /// Run the operation and return its simulated elapsed time
    pub fn apply(&self, index: &mut dyn DbIndex) -> f64 {
        match *self {
            Operation::Insert(n) => index.insert(n),
            Operation::Bulkload(n) => index.bulkload(n),
            Operation::Delete(n) => index.delete(n),
            Operation::FindPoint { queries } => index.find_point(queries),
            Operation::FindPointSelectivity {
                selectivity,
                queries,
            } => index.find_point_selectivity(selectivity, queries),
            Operation::FindRange { queries, len } => index.find_range(queries, len),
            Operation::FindRangeSelectivity {
                selectivity,
                queries,
            } => index.find_range_selectivity(selectivity, queries),
            Operation::SeedTopology(n) => {
                index.seed_topology(n);
                0.0
            }
        }
    }

    /// Short label for reports
    pub fn label(&self) -> String {
        match self {
            Operation::Insert(n) => format!("insert {}", n),
            Operation::Bulkload(n) => format!("bulkload {}", n),
            Operation::Delete(n) => format!("delete {}", n),
            Operation::FindPoint { queries } => format!("point x{}", queries),
            Operation::FindPointSelectivity {
                selectivity,
                queries,
            } => format!("point {:.4} x{}", selectivity, queries),
            Operation::FindRange { queries, len } => format!("range {} x{}", len, queries),
            Operation::FindRangeSelectivity {
                selectivity,
                queries,
            } => format!("range {:.4} x{}", selectivity, queries),
            Operation::SeedTopology(n) => format!("seed {}", n),
        }
    }
}

/// An ordered sequence of operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    operations: Vec<Operation>,
}

impl Workload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation (builder style)
    pub fn push(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Run every operation in order, returning each one's elapsed time
    pub fn run(&self, index: &mut dyn DbIndex) -> Vec<f64> {
        self.operations.iter().map(|op| op.apply(index)).collect()
    }

    /// Write the workload to a bincode file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a workload written by [`Workload::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

impl FromIterator<Operation> for Workload {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}
