//! Mixed insert/delete/search throughput workload.
//!
//! Each worker draws an operation from a fixed pool whose composition
//! encodes the requested update rate, and a key uniformly from
//! `1..=range`. Workers start together behind a barrier and stop early when
//! the shared stop flag is raised.

use common::{IndexError, Key, OrderedIndex, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Number of slots in the operation pool.
pub const POOL_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Delete,
    Search,
}

/// Fixed table of operations sampled uniformly by the workers.
///
/// Half the update rate goes to inserts, half to deletes, the rest to
/// searches.
#[derive(Debug, Clone)]
pub struct OperationPool {
    ops: Vec<Operation>,
}

impl OperationPool {
    pub fn new(update_rate: u32) -> Result<Self> {
        if update_rate > 100 {
            return Err(IndexError::InvalidArgument(format!(
                "update rate {update_rate}% is above 100%"
            )));
        }
        let per_kind = update_rate as usize * POOL_SIZE / 200;
        let mut ops = Vec::with_capacity(POOL_SIZE);
        ops.resize(per_kind, Operation::Insert);
        ops.resize(2 * per_kind, Operation::Delete);
        ops.resize(POOL_SIZE, Operation::Search);
        Ok(Self { ops })
    }

    pub fn draw(&self, rng: &mut impl Rng) -> Operation {
        self.ops[rng.gen_range(0..self.ops.len())]
    }

    pub fn count(&self, op: Operation) -> usize {
        self.ops.iter().filter(|&&o| o == op).count()
    }

    /// Share of the pool taken by `op`, in percent.
    pub fn percent(&self, op: Operation) -> f64 {
        self.count(op) as f64 * 100.0 / POOL_SIZE as f64
    }
}

/// Parameters for one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadConfig {
    /// Keys are drawn from `1..=range`.
    pub range: Key,
    pub threads: usize,
    /// Total operations across all workers.
    pub iterations: usize,
    /// Percentage of operations that modify the index.
    pub update_rate: u32,
    pub seed: u64,
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.range < 1 {
            return Err(IndexError::InvalidArgument(format!(
                "key range must be at least 1, got {}",
                self.range
            )));
        }
        if self.threads == 0 {
            return Err(IndexError::InvalidArgument(
                "at least one worker thread is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Operations each worker runs; the total is rounded up to a multiple of
    /// the thread count.
    pub fn iterations_per_thread(&self) -> usize {
        self.iterations.div_ceil(self.threads.max(1))
    }
}

/// Attempted and successful operations of one worker, or of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub inserts: u64,
    pub deletes: u64,
    pub searches: u64,
    pub inserts_ok: u64,
    pub deletes_ok: u64,
    pub searches_ok: u64,
    pub elapsed: Duration,
}

impl WorkerStats {
    fn record(&mut self, op: Operation, succeeded: bool) {
        let (attempted, ok) = match op {
            Operation::Insert => (&mut self.inserts, &mut self.inserts_ok),
            Operation::Delete => (&mut self.deletes, &mut self.deletes_ok),
            Operation::Search => (&mut self.searches, &mut self.searches_ok),
        };
        *attempted += 1;
        if succeeded {
            *ok += 1;
        }
    }

    /// Sums the counters; the elapsed time is that of the slowest worker.
    pub fn merge(&mut self, other: &WorkerStats) {
        self.inserts += other.inserts;
        self.deletes += other.deletes;
        self.searches += other.searches;
        self.inserts_ok += other.inserts_ok;
        self.deletes_ok += other.deletes_ok;
        self.searches_ok += other.searches_ok;
        self.elapsed = self.elapsed.max(other.elapsed);
    }

    pub fn total_ops(&self) -> u64 {
        self.inserts + self.deletes + self.searches
    }
}

/// Result of one run against one index.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub index: String,
    pub config: WorkloadConfig,
    pub insert_percent: f64,
    pub delete_percent: f64,
    pub totals: WorkerStats,
    pub final_len: usize,
    pub interrupted: bool,
}

impl BenchmarkReport {
    /// `range, ins%, del%, threads, ins, del, search, ins_ok, del_ok, search_ok, ms`
    pub fn csv_line(&self) -> String {
        let t = &self.totals;
        format!(
            "{}, {:.2}, {:.2}, {}, {}, {}, {}, {}, {}, {}, {}",
            self.config.range,
            self.insert_percent,
            self.delete_percent,
            self.config.threads,
            t.inserts,
            t.deletes,
            t.searches,
            t.inserts_ok,
            t.deletes_ok,
            t.searches_ok,
            t.elapsed.as_millis()
        )
    }

    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.totals.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.totals.total_ops() as f64 / secs
    }
}

/// Renders a results table, one row per report.
pub fn render_table(reports: &[BenchmarkReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "| Index           | Threads | Operations   | Time            | Ops/sec      | Final size |"
    );
    let _ = writeln!(
        out,
        "|-----------------|---------|--------------|-----------------|--------------|------------|"
    );
    for report in reports {
        let _ = writeln!(
            out,
            "| {:<15} | {:<7} | {:<12} | {:<15?} | {:<12.0} | {:<10} |{}",
            report.index,
            report.config.threads,
            report.totals.total_ops(),
            report.totals.elapsed,
            report.ops_per_sec(),
            report.final_len,
            if report.interrupted { " (interrupted)" } else { "" }
        );
    }
    out
}

/// Inserts `count` random keys from `1..=range`, inserting `key -> key`.
///
/// Duplicates are drawn like any other key, so the index may end up with
/// fewer than `count` entries. Returns how many inserts succeeded.
pub fn prefill(index: &dyn OrderedIndex, count: usize, range: Key, rng: &mut impl Rng) -> usize {
    let mut inserted = 0;
    for _ in 0..count {
        let key = rng.gen_range(1..=range);
        if index.insert(key, key) {
            inserted += 1;
        }
    }
    inserted
}

/// Runs the mixed workload on `index` from `config.threads` workers.
pub fn run_benchmark(
    index: Arc<dyn OrderedIndex>,
    config: &WorkloadConfig,
    stop: Arc<AtomicBool>,
) -> Result<BenchmarkReport> {
    config.validate()?;
    let pool = Arc::new(OperationPool::new(config.update_rate)?);
    let per_thread = config.iterations_per_thread();
    let barrier = Arc::new(Barrier::new(config.threads));
    let range = config.range;

    info!(
        index = index.name(),
        threads = config.threads,
        per_thread,
        "Starting benchmark"
    );

    let mut seeds = StdRng::seed_from_u64(config.seed);
    let handles: Vec<_> = (0..config.threads)
        .map(|worker| {
            let index = Arc::clone(&index);
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            let stop = Arc::clone(&stop);
            let mut op_rng = StdRng::seed_from_u64(seeds.gen());
            let mut key_rng = StdRng::seed_from_u64(seeds.gen());

            thread::spawn(move || {
                let mut stats = WorkerStats::default();
                barrier.wait();
                let start = Instant::now();

                for _ in 0..per_thread {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let op = pool.draw(&mut op_rng);
                    let key = key_rng.gen_range(1..=range);
                    let succeeded = match op {
                        Operation::Insert => index.insert(key, key),
                        Operation::Delete => index.delete(key).is_some(),
                        Operation::Search => index.search(key).is_some(),
                    };
                    stats.record(op, succeeded);
                }

                stats.elapsed = start.elapsed();
                debug!(worker, ops = stats.total_ops(), "Worker finished");
                stats
            })
        })
        .collect();

    let mut totals = WorkerStats::default();
    for handle in handles {
        let stats = handle
            .join()
            .map_err(|_| IndexError::Corruption("benchmark worker panicked".to_string()))?;
        totals.merge(&stats);
    }

    let interrupted = stop.load(Ordering::Relaxed);
    info!(
        index = index.name(),
        ops = totals.total_ops(),
        elapsed_ms = totals.elapsed.as_millis() as u64,
        interrupted,
        "Benchmark finished"
    );

    Ok(BenchmarkReport {
        index: index.name().to_string(),
        config: *config,
        insert_percent: pool.percent(Operation::Insert),
        delete_percent: pool.percent(Operation::Delete),
        totals,
        final_len: index.len(),
        interrupted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::LockedBTreeMap;
    use bptree::BPlusTree;
    use test_case::test_case;

    fn config(threads: usize, iterations: usize, update_rate: u32) -> WorkloadConfig {
        WorkloadConfig {
            range: 500,
            threads,
            iterations,
            update_rate,
            seed: 42,
        }
    }

    #[test_case(0, 0, 1000 ; "search_only")]
    #[test_case(10, 50, 900 ; "ten_percent")]
    #[test_case(15, 75, 850 ; "odd_rate")]
    #[test_case(100, 500, 0 ; "update_only")]
    fn test_operation_pool_mix(update_rate: u32, per_kind: usize, searches: usize) {
        let pool = OperationPool::new(update_rate).unwrap();
        assert_eq!(pool.count(Operation::Insert), per_kind);
        assert_eq!(pool.count(Operation::Delete), per_kind);
        assert_eq!(pool.count(Operation::Search), searches);
    }

    #[test]
    fn test_operation_pool_rejects_rate_above_hundred() {
        assert!(matches!(
            OperationPool::new(101),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_iterations_round_up() {
        assert_eq!(config(3, 10, 10).iterations_per_thread(), 4);
        assert_eq!(config(4, 8, 10).iterations_per_thread(), 2);
    }

    #[test]
    fn test_invalid_config() {
        assert!(config(0, 10, 10).validate().is_err());
        let mut bad_range = config(1, 10, 10);
        bad_range.range = 0;
        assert!(bad_range.validate().is_err());
    }

    #[test]
    fn test_prefill_inserts_key_as_value() {
        let index = LockedBTreeMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let inserted = prefill(&index, 200, 50, &mut rng);
        assert_eq!(inserted, index.len());
        assert!(index.len() <= 50);
        assert!(index.range_scan(1, 50).iter().all(|&(k, v)| k == v));
    }

    #[test_case(1 ; "single_thread")]
    #[test_case(4 ; "four_threads")]
    fn test_run_benchmark_counts(threads: usize) {
        let tree = Arc::new(BPlusTree::new(4).unwrap());
        let cfg = config(threads, 4_000, 40);
        let report = run_benchmark(tree.clone(), &cfg, Arc::new(AtomicBool::new(false))).unwrap();

        let t = report.totals;
        assert_eq!(t.total_ops() as usize, cfg.iterations_per_thread() * threads);
        assert!(t.inserts_ok <= t.inserts);
        assert!(t.deletes_ok <= t.deletes);
        assert!(t.searches_ok <= t.searches);
        assert_eq!(t.inserts_ok - t.deletes_ok, tree.len() as u64);
        assert_eq!(report.final_len, tree.len());
        assert!(!report.interrupted);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_stop_flag_ends_run_early() {
        let index = Arc::new(LockedBTreeMap::new());
        let stop = Arc::new(AtomicBool::new(true));
        let report = run_benchmark(index, &config(2, 10_000, 10), stop).unwrap();
        assert_eq!(report.totals.total_ops(), 0);
        assert!(report.interrupted);
    }

    #[test]
    fn test_csv_line_format() {
        let report = BenchmarkReport {
            index: "BPlusTree".to_string(),
            config: config(2, 100, 10),
            insert_percent: 5.0,
            delete_percent: 5.0,
            totals: WorkerStats {
                inserts: 5,
                deletes: 4,
                searches: 91,
                inserts_ok: 3,
                deletes_ok: 1,
                searches_ok: 20,
                elapsed: Duration::from_millis(12),
            },
            final_len: 2,
            interrupted: false,
        };
        assert_eq!(report.csv_line(), "500, 5.00, 5.00, 2, 5, 4, 91, 3, 1, 20, 12");
        assert!(render_table(&[report]).contains("| BPlusTree"));
    }
}
