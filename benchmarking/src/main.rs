mod baseline;
mod correctness;
mod workload;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use baseline::LockedBTreeMap;
use bptree::BPlusTree;
use clap::Parser;
use common::{Key, OrderedIndex, Result, TreeConfig, DEFAULT_ORDER};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use workload::{prefill, render_table, run_benchmark, WorkloadConfig};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Concurrent B+ tree benchmark and correctness driver",
    long_about = None
)]
struct Args {
    /// Keys are drawn from 1..=RANGE
    #[arg(short, long, env = "BPT_RANGE", default_value_t = 5_000_000)]
    range: Key,

    /// Number of worker threads
    #[arg(short = 'n', long, env = "BPT_THREADS", default_value_t = 1)]
    threads: usize,

    /// Run the correctness tests instead of the benchmark
    #[arg(short = 't', long = "test", env = "BPT_TEST_MODE")]
    test_mode: bool,

    /// Number of random keys inserted before timing starts
    #[arg(short, long, env = "BPT_INITIAL", default_value_t = 1023)]
    initial: usize,

    /// Percentage of operations that are updates (half inserts, half deletes)
    #[arg(
        short,
        long,
        env = "BPT_UPDATE_RATE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(0..=100)
    )]
    update_rate: u32,

    /// Random seed, 0 picks one from the clock
    #[arg(short, long, env = "BPT_SEED", default_value_t = 0)]
    seed: u64,

    /// Tree order (maximum fan-out)
    #[arg(short, long, env = "BPT_ORDER", default_value_t = DEFAULT_ORDER)]
    order: usize,

    /// Total operations (benchmark) or keys inserted (test mode)
    #[arg(long, env = "BPT_ITERATIONS", default_value_t = 5_000_000)]
    iterations: usize,

    /// Also run the workload against a locked BTreeMap
    #[arg(long)]
    baseline: bool,

    /// Insert random keys instead of increasing ones in test mode
    #[arg(long)]
    random_keys: bool,
}

fn main() -> ExitCode {
    common::logging::init_tracing();
    let mut args = Args::parse();

    if args.seed == 0 {
        args.seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1);
    }
    info!(
        range = args.range,
        update_rate = args.update_rate,
        threads = args.threads,
        initial = args.initial,
        seed = args.seed,
        order = args.order,
        test_mode = args.test_mode,
        "Parameters"
    );

    let result = if args.test_mode {
        run_correctness(&args)
    } else {
        run_benchmarks(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_correctness(args: &Args) -> Result<()> {
    let config = TreeConfig::new(args.order)?;

    info!("Sequential test");
    let tree = BPlusTree::with_config(config);
    let stats = correctness::sequential_test(&tree, args.iterations, args.random_keys, args.seed)?;
    info!(height = stats.height, leaves = stats.leaf_nodes, "PASSED");

    info!("Parallel test");
    let tree = Arc::new(BPlusTree::with_config(config));
    let stats = correctness::parallel_test(
        tree,
        args.iterations,
        args.threads,
        args.range,
        args.random_keys,
        args.seed,
    )?;
    info!(height = stats.height, leaves = stats.leaf_nodes, "PASSED");
    Ok(())
}

fn run_benchmarks(args: &Args) -> Result<()> {
    let config = TreeConfig::new(args.order)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed)) {
        warn!("Could not install Ctrl-C handler: {e}");
    }

    let mut indexes: Vec<Arc<dyn OrderedIndex>> = vec![Arc::new(BPlusTree::with_config(config))];
    if args.baseline {
        indexes.push(Arc::new(LockedBTreeMap::new()));
    }

    let workload = WorkloadConfig {
        range: args.range,
        threads: args.threads,
        iterations: args.iterations,
        update_rate: args.update_rate,
        seed: args.seed,
    };
    workload.validate()?;

    let mut reports = Vec::new();
    for index in indexes {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if args.initial > 0 {
            info!(index = index.name(), count = args.initial, "Pre-filling");
            let mut rng = StdRng::seed_from_u64(args.seed);
            let inserted = prefill(index.as_ref(), args.initial, args.range, &mut rng);
            info!(inserted, "Pre-fill done");
        }

        let report = run_benchmark(index, &workload, Arc::clone(&stop))?;
        println!("{}", report.csv_line());
        reports.push(report);
    }

    println!("\n--- Benchmark Results ---");
    print!("{}", render_table(&reports));
    Ok(())
}
