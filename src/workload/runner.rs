//! Workload runner
//!
//! Runs one workload against several independent indexes in parallel.
//!
//! ## Pipeline
//! ```text
//!  jobs channel ──► worker 1 ──┐
//!   (slot, index)   worker 2 ──┼──► results channel ──► caller (single writer)
//!                   worker N ──┘     (slot, report)
//! ```
//! Each index owns its disk, so workers share nothing but the read-only
//! workload.

use crossbeam::channel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::counters::CounterReading;
use crate::error::{Result, SimError};
use crate::index::DbIndex;

use super::operation::Workload;

/// Outcome of running a workload against one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Index display name
    pub index: String,

    /// Device model name
    pub device: String,

    /// Elapsed time of each operation, in workload order
    pub step_times: Vec<f64>,

    /// Sum of `step_times`
    pub elapsed: f64,

    /// Device levels at the end of the run
    pub depth: usize,

    /// Live entries at the end of the run
    pub entries: u64,

    /// Bytes programmed on the device
    pub wear_out: u64,

    pub index_counters: Vec<CounterReading>,

    pub device_counters: Vec<CounterReading>,
}

impl RunReport {
    /// Run `workload` on `index` and summarize it
    pub fn collect(index: &mut dyn DbIndex, workload: &Workload) -> Self {
        let step_times = workload.run(index);
        let elapsed = step_times.iter().sum();

        Self {
            index: index.name().to_string(),
            device: index.disk().model().name.clone(),
            step_times,
            elapsed,
            depth: index.depth(),
            entries: index.entry_count(),
            wear_out: index.disk().wear_out(),
            index_counters: index.counters().snapshot(),
            device_counters: index.disk().counters().snapshot(),
        }
    }
}

/// Parallel runner with a fixed number of workers
#[derive(Debug, Clone)]
pub struct Runner {
    workers: usize,
}

impl Runner {
    /// Create a runner; at least one worker is used
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `workload` on every index; reports come back in input order
    pub fn run(&self, indexes: Vec<Box<dyn DbIndex>>, workload: &Workload) -> Result<Vec<RunReport>> {
        let total = indexes.len();
        let workers = self.workers.min(total.max(1));

        let (job_tx, job_rx) = channel::unbounded::<(usize, Box<dyn DbIndex>)>();
        let (result_tx, result_rx) = channel::unbounded::<(usize, RunReport)>();

        for job in indexes.into_iter().enumerate() {
            job_tx
                .send(job)
                .map_err(|e| SimError::Worker(format!("job queue closed: {}", e)))?;
        }
        drop(job_tx);

        info!(indexes = total, workers, steps = workload.len(), "starting run");

        let mut reports: Vec<Option<RunReport>> = vec![None; total];

        crossbeam::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for (slot, mut index) in job_rx.iter() {
                        debug!(worker, slot, index = index.name(), "running workload");
                        let report = RunReport::collect(index.as_mut(), workload);
                        if result_tx.send((slot, report)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            // Single writer: only this thread touches `reports`
            for (slot, report) in result_rx.iter() {
                reports[slot] = Some(report);
            }
        })
        .map_err(|_| SimError::Worker("a worker thread panicked".to_string()))?;

        reports
            .into_iter()
            .enumerate()
            .map(|(slot, report)| {
                report.ok_or_else(|| SimError::Worker(format!("no report for index {}", slot)))
            })
            .collect()
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }
}
