//! cascadesim CLI
//!
//! Builds a device and a set of index variants, replays one workload
//! against each on its own cloned disk, and prints the results.

use std::path::PathBuf;

use cascadesim::{
    DbIndex, Disk, IndexConfig, IndexConfigBuilder, LeveledIndex, MemoryModel, Operation, Runner,
    Workload,
};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// cascadesim
#[derive(Parser, Debug)]
#[command(name = "cascadesim")]
#[command(about = "Analytic cost simulator for leveled merge-cascade indexes")]
#[command(version)]
struct Args {
    /// Device model (flash, ssd, pcm)
    #[arg(short, long, default_value = "flash")]
    device: String,

    /// Index variants to compare (lsm, fp, columnar, flash-aware, stepped)
    #[arg(short, long, value_delimiter = ',', default_value = "lsm,fp,columnar,flash-aware,stepped")]
    variants: Vec<String>,

    /// Capacity ratio between consecutive levels
    #[arg(short = 'r', long, default_value = "5")]
    growth_ratio: u64,

    /// Buffer tier capacity in KiB
    #[arg(short, long, default_value = "72")]
    buffer_kb: u64,

    /// Entries to pre-size the index with (untimed)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Entries to bulk-load
    #[arg(long, default_value = "0")]
    bulkload: u64,

    /// Entries to insert one at a time
    #[arg(short, long, default_value = "100000")]
    inserts: u64,

    /// Entries to delete
    #[arg(long, default_value = "0")]
    deletes: u64,

    /// Point lookups to run
    #[arg(short, long, default_value = "1000")]
    lookups: u64,

    /// Range lookups to run, each covering `range_selectivity` of the data
    #[arg(long, default_value = "10")]
    ranges: u64,

    /// Fraction of the entries each range lookup returns
    #[arg(long, default_value = "0.01")]
    range_selectivity: f64,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Replay a saved workload instead of building one from the flags
    #[arg(short, long)]
    workload: Option<PathBuf>,

    /// Save the workload that was run
    #[arg(long)]
    save_workload: Option<PathBuf>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cascadesim=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("cascadesim v{}", cascadesim::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> cascadesim::Result<()> {
    let model = MemoryModel::preset(&args.device).ok_or_else(|| {
        cascadesim::SimError::Config(format!("unknown device '{}'", args.device))
    })?;
    tracing::info!("Device: {} ({} B pages)", model.name, model.page_size);
    let disk = Disk::new(model)?;

    let mut indexes: Vec<Box<dyn DbIndex>> = Vec::new();
    for name in &args.variants {
        let preset = IndexConfig::preset(name).ok_or_else(|| {
            cascadesim::SimError::Config(format!("unknown variant '{}'", name))
        })?;
        let config = IndexConfigBuilder::from_config(preset)
            .growth_ratio(args.growth_ratio)
            .buffer_capacity(args.buffer_kb * 1024)
            .build()?;
        indexes.push(Box::new(LeveledIndex::new(config, disk.clone_empty())));
    }

    let workload = match &args.workload {
        Some(path) => {
            tracing::info!("Loading workload from {}", path.display());
            Workload::load(path)?
        }
        None => build_workload(&args),
    };

    if let Some(path) = &args.save_workload {
        workload.save(path)?;
        tracing::info!("Workload saved to {}", path.display());
    }

    let runner = args.threads.map(Runner::new).unwrap_or_default();
    let reports = runner.run(indexes, &workload)?;

    for report in &reports {
        println!("== {} on {}", report.index, report.device);
        for (op, elapsed) in workload.operations().iter().zip(&report.step_times) {
            println!("  {:<28} {:>14.6}s", op.label(), elapsed);
        }
        println!("  {:<28} {:>14.6}s", "total", report.elapsed);
        println!(
            "  depth {}, entries {}, wear-out {} bytes",
            report.depth, report.entries, report.wear_out
        );
        for reading in report.index_counters.iter().filter(|r| r.value.as_f64() != 0.0) {
            println!("  {:<28} {}", reading.name, reading.value);
        }
    }

    Ok(())
}

fn build_workload(args: &Args) -> Workload {
    let steps = [
        (args.seed > 0).then_some(Operation::SeedTopology(args.seed)),
        (args.bulkload > 0).then_some(Operation::Bulkload(args.bulkload)),
        (args.inserts > 0).then_some(Operation::Insert(args.inserts)),
        (args.deletes > 0).then_some(Operation::Delete(args.deletes)),
        (args.lookups > 0).then_some(Operation::FindPoint {
            queries: args.lookups,
        }),
        (args.ranges > 0).then_some(Operation::FindRangeSelectivity {
            selectivity: args.range_selectivity,
            queries: args.ranges,
        }),
    ];

    steps.into_iter().flatten().collect()
}
