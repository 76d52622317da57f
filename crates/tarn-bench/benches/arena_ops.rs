//! Criterion micro-benchmarks for arena open, allocation, handle
//! access, and resize.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tarn_arena::{Arena, RegionKind};
use tarn_bench::bench_arena;
use tarn_cache::MemorySizeStore;

/// Benchmark: open an arena against an empty store (default sizes,
/// record written back).
fn bench_open_default(c: &mut Criterion) {
    c.bench_function("arena_open_default", |b| {
        b.iter(|| {
            let store = MemorySizeStore::new();
            black_box(Arena::open("bench-app", &store).unwrap())
        });
    });
}

/// Benchmark: 1000 bump allocations of 64 bytes from the static region.
fn bench_static_alloc(c: &mut Criterion) {
    c.bench_function("static_alloc_64b_x1000", |b| {
        b.iter_batched(
            || bench_arena(64 * 1024, 0),
            |mut arena| {
                for _ in 0..1_000 {
                    black_box(arena.alloc(RegionKind::Static, 64).unwrap());
                }
                arena
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: write then read 256 bytes through a checked handle.
fn bench_handle_access(c: &mut Criterion) {
    let mut arena = bench_arena(4_096, 0);
    let handle = arena.alloc(RegionKind::Static, 1_024).unwrap();
    c.bench_function("handle_set_get_256b", |b| {
        b.iter(|| {
            for i in 0..256usize {
                handle.set_at(i, i as u8).unwrap();
            }
            black_box(handle.get_at(255).unwrap())
        });
    });
}

/// Benchmark: grow the arena by 64KB (buffer may move).
fn bench_resize_grow(c: &mut Criterion) {
    c.bench_function("resize_grow_64k", |b| {
        b.iter_batched(
            || bench_arena(1_024, 1_024),
            |mut arena| {
                let total = arena.total_size();
                arena.resize(total + 64 * 1024).unwrap();
                arena
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_open_default,
    bench_static_alloc,
    bench_handle_access,
    bench_resize_grow
);
criterion_main!(benches);
