//! Core types and persistence contracts for the Tarn allocator.
//!
//! This crate holds the vocabulary shared by the arena (`tarn-arena`) and
//! the size-cache stores (`tarn-cache`): the application identifier, the
//! persisted size record, and the [`SizeStore`] contract the arena reads
//! its tuning data through. It has no dependencies and no I/O.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod record;

pub use id::AppId;
pub use record::{SizeRecord, SizeStore};
