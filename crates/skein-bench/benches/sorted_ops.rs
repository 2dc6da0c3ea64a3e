//! Criterion micro-benchmarks for sorted-list insertion, lookup, and removal.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use skein_bench::{filled_sorted, scrambled_keys};
use skein_sorted::SortedList;

fn bench_add_scrambled_5k(c: &mut Criterion) {
    let keys = scrambled_keys(5_000, 42);
    c.bench_function("sorted_add_scrambled_5k", |b| {
        b.iter(|| {
            let sorted = SortedList::new();
            for &key in &keys {
                sorted.add(key, key).unwrap();
            }
            black_box(sorted.len())
        });
    });
}

fn bench_lookup_5k(c: &mut Criterion) {
    let sorted = filled_sorted(5_000, 42).unwrap();
    let keys = scrambled_keys(5_000, 7);
    c.bench_function("sorted_lookup_5k", |b| {
        b.iter(|| {
            let mut hits = 0u64;
            for key in &keys {
                if let Some(value) = sorted.try_get(key) {
                    hits += value & 1;
                }
            }
            black_box(hits)
        });
    });
}

fn bench_ensure_counts(c: &mut Criterion) {
    let keys: Vec<u64> = scrambled_keys(4_096, 3).into_iter().map(|k| k % 256).collect();
    c.bench_function("sorted_ensure_counts_4k", |b| {
        b.iter(|| {
            let counts: SortedList<u64, u32> = SortedList::new();
            for &key in &keys {
                *counts.ensure_default(key).unwrap() += 1;
            }
            black_box(counts.len())
        });
    });
}

fn bench_remove_all_1k(c: &mut Criterion) {
    let keys = scrambled_keys(1_000, 9);
    c.bench_function("sorted_remove_all_1k", |b| {
        b.iter_batched(
            || filled_sorted(1_000, 42).unwrap(),
            |sorted| {
                for key in &keys {
                    sorted.remove(key).unwrap();
                }
                sorted
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_add_scrambled_5k,
    bench_lookup_5k,
    bench_ensure_counts,
    bench_remove_all_1k
);
criterion_main!(benches);
