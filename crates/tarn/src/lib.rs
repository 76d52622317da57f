//! Tarn: relocation-safe arena allocation with persisted size tuning.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Tarn sub-crates. For most users, adding `tarn` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tarn::prelude::*;
//!
//! // Any SizeStore works; the file-backed one persists across runs.
//! let store = MemorySizeStore::new();
//!
//! let mut arena = Arena::open("example-app", &store).unwrap();
//! let text = arena.alloc(RegionKind::Static, 16).unwrap();
//! text.copy_from_slice(b"hello").unwrap();
//! assert_eq!(text.to_vec(5).unwrap(), b"hello");
//!
//! // Growing the arena may move the buffer; the handle never notices.
//! let total = arena.total_size();
//! arena.resize(total + 4096).unwrap();
//! assert_eq!(text.to_vec(5).unwrap(), b"hello");
//!
//! // Remember the observed sizes for the next run.
//! arena.persist_sizes(&store);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `tarn-arena` | `Arena`, regions, relocatable handles |
//! | [`types`] | `tarn-core` | `AppId`, `SizeRecord`, the `SizeStore` contract |
//! | [`cache`] | `tarn-cache` | Record codec, file and in-memory stores |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena, regions, and relocatable handles (`tarn-arena`).
pub use tarn_arena as arena;

/// Record codec plus the file-backed and in-memory stores (`tarn-cache`).
pub use tarn_cache as cache;

/// Core ids, the persisted record, and the store contract (`tarn-core`).
pub use tarn_core as types;

/// Common imports for typical Tarn usage.
///
/// ```rust
/// use tarn::prelude::*;
/// ```
pub mod prelude {
    pub use tarn_arena::{
        Arena, ArenaConfig, ArenaError, BoundsMode, Checked, RegionKind, RelPtr, Unchecked,
    };
    pub use tarn_cache::{FileSizeStore, MemorySizeStore};
    pub use tarn_core::{AppId, SizeRecord, SizeStore};
}
