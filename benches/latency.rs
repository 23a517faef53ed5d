//! Criterion latency benches for the matching core.
//!
//! Measures the three shapes that matter:
//! - rest (no match)
//! - full match at one level
//! - sweep across multiple levels

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use microlob::{MatchingEngine, NullSink, Side};

/// Benchmark: order that rests without crossing
fn bench_rest_no_match(c: &mut Criterion) {
    let mut order_id = 0i64;

    c.bench_function("rest_no_match", |b| {
        // Fresh engine per batch so resting orders never exhaust the pool
        b.iter_batched_ref(
            || MatchingEngine::with_capacity(1 << 16, 1024),
            |engine| {
                let mut sink = NullSink;
                order_id += 1;
                // Bids far below any ask: always rests
                engine.accept_order(order_id, 9_000, 100, Side::Buy, &mut sink);
                black_box(engine.best_bid())
            },
            BatchSize::NumIterations(10_000),
        )
    });
}

/// Benchmark: order that fully matches against queue depth
fn bench_full_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_match");

    for depth in [1i64, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let mut engine = MatchingEngine::with_capacity(1 << 20, 1024);
            let mut sink = NullSink;

            for i in 0..depth {
                engine.accept_order(i, 10_000, 100, Side::Sell, &mut sink);
            }

            let mut order_id = 1_000_000i64;
            b.iter(|| {
                order_id += 2;
                engine.accept_order(order_id, 10_000, 100, Side::Buy, &mut sink);
                // Replenish so the queue depth stays constant
                engine.accept_order(order_id + 1, 10_000, 100, Side::Sell, &mut sink);
                black_box(engine.best_ask())
            })
        });
    }

    group.finish();
}

/// Benchmark: sweep across several price levels
fn bench_level_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_sweep");

    for levels in [2i64, 5, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let mut engine = MatchingEngine::with_capacity(1 << 20, 1024);
            let mut sink = NullSink;
            let mut order_id = 0i64;

            b.iter(|| {
                for i in 0..levels {
                    order_id += 1;
                    engine.accept_order(order_id, 10_000 + i, 10, Side::Sell, &mut sink);
                }
                order_id += 1;
                engine.accept_order(
                    order_id,
                    10_000 + levels,
                    10 * levels,
                    Side::Buy,
                    &mut sink,
                );
                black_box(engine.open_orders())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rest_no_match, bench_full_match, bench_level_sweep);
criterion_main!(benches);
