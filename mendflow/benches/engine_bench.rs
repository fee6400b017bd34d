//! Benchmarks for breaker transitions and backoff arithmetic.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mendflow::clock::SystemClock;
use mendflow::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn breaker_benchmark(c: &mut Criterion) {
    let registry = BreakerRegistry::new(Arc::new(SystemClock));
    let key = FailureDetails::new(FailureKind::Network, Severity::Warning, "sync")
        .with_operation("fetch")
        .key();

    c.bench_function("breaker_record_and_check", |b| {
        b.iter(|| {
            registry.record_failure(black_box(&key), 5, Duration::from_secs(60));
            black_box(registry.is_open(&key));
            registry.record_success(&key);
        });
    });
}

fn backoff_benchmark(c: &mut Criterion) {
    let config = RetryConfig::default();

    c.bench_function("backoff_delay", |b| {
        b.iter(|| {
            for attempt in 0..16 {
                black_box(config.delay_for_attempt(black_box(attempt)));
            }
        });
    });
}

criterion_group!(benches, breaker_benchmark, backoff_benchmark);
criterion_main!(benches);
