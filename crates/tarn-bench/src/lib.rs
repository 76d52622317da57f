//! Benchmark fixtures for the Tarn allocator.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tarn_arena::{Arena, ArenaConfig};
use tarn_core::AppId;

/// Build an arena with explicit region sizes, bypassing any size store.
pub fn bench_arena(static_size: usize, dynamic_size: usize) -> Arena {
    Arena::with_config(
        AppId::from_name("tarn-bench"),
        &ArenaConfig::new(static_size, dynamic_size),
    )
    .expect("bench arena allocation")
}
