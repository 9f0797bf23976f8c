//! Adaptive mutation selector benchmarks.
//!
//! Measures `select()` plus the feedback hooks under a realistic
//! apply/succeed/fail cycle, across strategy-pool sizes.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use perffuzz_selector::{AdaptiveMutationSelector, SelectorConfig};

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
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let throughput_ops_s = if self.total_ns == 0 {
            0.0
        } else {
            (self.total_iters as f64) / (self.total_ns as f64 / 1e9)
        };

        println!(
            "SELECTOR_BENCH bench={} samples={} p50_ns_op={:.3} p95_ns_op={:.3} mean_ns_op={:.3} throughput_ops_s={:.3}",
            bench_label,
            samples.len(),
            p50,
            p95,
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

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("strategy-{i}")).collect()
}

fn bench_select_and_feedback(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_cycle");
    group.throughput(Throughput::Elements(1));

    for &count in &[3usize, 10, 30] {
        let stats = RefCell::new(BenchStats::default());

        group.bench_with_input(BenchmarkId::new("select_apply_feedback", count), &count, |b, &count| {
            b.iter_custom(|iters| {
                let mut selector = AdaptiveMutationSelector::new(names(count), SelectorConfig::default(), 7);
                let start = Instant::now();
                for i in 0..iters {
                    let Some(idx) = selector.select() else {
                        continue;
                    };
                    selector.notify_applied(idx);
                    if i % 5 == 0 {
                        selector.notify_new_seed_generated(idx, i % 25 == 0);
                    } else {
                        selector.notify_seed_rejected(idx);
                    }
                    black_box(idx);
                }
                let dur = start.elapsed().max(Duration::from_nanos(1));
                stats.borrow_mut().record(iters, dur);
                dur
            });
        });
        stats.borrow().report(&format!("cycle_{count}"));
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(100);
    targets = bench_select_and_feedback
);
criterion_main!(benches);
