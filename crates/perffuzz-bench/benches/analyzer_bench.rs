//! Differential analyzer benchmarks.
//!
//! Measures the per-call cost of `analyze()` as the number of configured
//! runtime targets grows, since clustering is pairwise over that count.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use perffuzz_analyzer::{AnalyzerConfig, SignificanceLevel, analyze};
use perffuzz_metrics::PerformanceMetrics;

#[derive(Default)]
struct BenchStats {
    samples_ns_per_op: Vec<f64>,
    total_iters: u64,
    total_ns: u128,
}

impl BenchStats {
    fn record(&mut self, iters: u64, dur: Duration) {
        let ns = dur.as_nanos();
        self.total_iters = self.total_iters.saturating_add(iters);
        self.total_ns = self.total_ns.saturating_add(ns);
        self.samples_ns_per_op.push(ns as f64 / iters as f64);
    }

    fn report(&self, bench_label: &str) {
        let mut samples = self.samples_ns_per_op.clone();
        if samples.is_empty() {
            return;
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let p50 = percentile_sorted(&samples, 0.50);
        let p95 = percentile_sorted(&samples, 0.95);
        let p99 = percentile_sorted(&samples, 0.99);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let throughput_ops_s = if self.total_ns == 0 {
            0.0
        } else {
            (self.total_iters as f64) / (self.total_ns as f64 / 1e9)
        };

        println!(
            "ANALYZER_BENCH bench={} samples={} p50_ns_op={:.3} p95_ns_op={:.3} p99_ns_op={:.3} mean_ns_op={:.3} throughput_ops_s={:.3}",
            bench_label,
            samples.len(),
            p50,
            p95,
            p99,
            mean,
            throughput_ops_s
        );
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&p));
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn metrics_for(runtime_count: usize, divergent: bool) -> BTreeMap<String, PerformanceMetrics> {
    let mut out = BTreeMap::new();
    for i in 0..runtime_count {
        let base = 100.0 + if divergent && i == runtime_count - 1 { 40.0 } else { 0.0 };
        out.insert(
            format!("runtime-{i}"),
            PerformanceMetrics::Ok {
                score: base,
                error: 2.0,
                min: base - 4.0,
                max: base + 4.0,
                memory_kb: Some(1024),
                report_path: std::path::PathBuf::from("bench-report.json"),
            },
        );
    }
    out
}

fn bench_analyze(c: &mut Criterion) {
    let config = AnalyzerConfig::default();
    let mut group = c.benchmark_group("analyze");
    group.throughput(Throughput::Elements(1));

    for &runtime_count in &[2usize, 4, 8, 16] {
        let clean = metrics_for(runtime_count, false);
        let divergent = metrics_for(runtime_count, true);

        let stats = RefCell::new(BenchStats::default());
        group.bench_with_input(BenchmarkId::new("clean", runtime_count), &clean, |b, metrics| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    black_box(analyze(metrics, SignificanceLevel::SeedEvolution, config));
                }
                let dur = start.elapsed().max(Duration::from_nanos(1));
                stats.borrow_mut().record(iters, dur);
                dur
            });
        });
        stats.borrow().report(&format!("clean_{runtime_count}"));

        let stats = RefCell::new(BenchStats::default());
        group.bench_with_input(BenchmarkId::new("divergent", runtime_count), &divergent, |b, metrics| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    black_box(analyze(metrics, SignificanceLevel::Reporting, config));
                }
                let dur = start.elapsed().max(Duration::from_nanos(1));
                stats.borrow_mut().record(iters, dur);
                dur
            });
        });
        stats.borrow().report(&format!("divergent_{runtime_count}"));
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(100);
    targets = bench_analyze
);
criterion_main!(benches);
