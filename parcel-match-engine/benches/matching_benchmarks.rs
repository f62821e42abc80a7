//! Criterion benchmarks for the greedy matcher.
//!
//! Measures matching time as the fleet and parcel counts grow, once for the
//! single greedy pass and once with a handful of departure restarts.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package parcel-match-engine
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use parcel_match_core::Matcher;
use parcel_match_engine::{GreedyMatcher, GreedyMatcherConfig};


use bench_support::{BENCHMARK_SEED, generate_instance};

/// `(drivers, parcels)` pairs to benchmark.
const PROBLEM_SIZES: &[(usize, usize)] = &[(10, 50), (25, 100), (50, 200)];

fn bench_matching(c: &mut Criterion, name: &str, config: GreedyMatcherConfig) {
    let mut group = c.benchmark_group(name);
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(10));

    let matcher = GreedyMatcher::with_config(config);
    for &(drivers, parcels) in PROBLEM_SIZES {
        let instance = generate_instance(drivers, parcels, BENCHMARK_SEED);
        group.throughput(Throughput::Elements(u64::try_from(parcels).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::new("parcels", parcels), &instance, |b, instance| {
            b.iter(|| {
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Benchmarking matching performance, result is intentionally discarded"
                )]
                let _ = matcher.solve(instance);
            });
        });
    }

    group.finish();
}

fn bench_single_pass(c: &mut Criterion) {
    bench_matching(c, "single_pass", GreedyMatcherConfig::default());
}

fn bench_restarts(c: &mut Criterion) {
    bench_matching(
        c,
        "restarts",
        GreedyMatcherConfig {
            constrained_restarts: 3,
            full_restarts: 3,
            seed: BENCHMARK_SEED,
        },
    );
}

criterion_group!(benches, bench_single_pass, bench_restarts);
criterion_main!(benches);
