//! Relocation-safe arena allocation for engine-style applications.
//!
//! One [`Arena`] owns the single heap buffer backing every sub-allocator
//! of an application instance:
//!
//! ```text
//! Arena (owner)
//! ├── BaseCell        (the one buffer, behind a shared RefCell)
//! ├── Region × 2      (static / dynamic bump allocators + canaries)
//! └── RelPtr<T, M>    (byte offset + weak buffer ref; survives resize)
//! ```
//!
//! Handles never store an address. Every access resolves `base + offset`
//! against the buffer's current contents, which is what lets
//! [`Arena::resize`] move the whole allocation without invalidating a
//! single outstanding handle.
//!
//! Region sizes come from the persisted size record for the application
//! ([`tarn_core::SizeRecord`], reached through a [`tarn_core::SizeStore`]).
//! A missing, corrupt, or version-mismatched record falls back to the
//! compiled-in defaults and is rewritten for the next run; a record that
//! fails to write only costs the next run its tuning.
//!
//! One arena is driven by one logical thread: no locks, no atomics, and
//! the shared-cell types are intentionally `!Send`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
mod buffer;
pub mod config;
pub mod error;
pub mod handle;
pub mod region;

pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::{BoundsMode, Checked, RelPtr, Span, Unchecked};
pub use region::{Region, RegionKind};
