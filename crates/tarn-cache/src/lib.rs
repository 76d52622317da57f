//! Persisted size-cache records for Tarn arena tuning.
//!
//! The arena wants exactly two operations from its environment: "give me
//! the size record for this app" and "persist this size record". This
//! crate provides the binary codec for the record plus two
//! [`tarn_core::SizeStore`] implementations:
//!
//! - [`FileSizeStore`] — one `engine.cache` file per application id
//!   under a root directory, for real deployments.
//! - [`MemorySizeStore`] — an in-process map, for tests and embedders
//!   that have no persistent storage.
//!
//! Every failure on this side of the contract is soft: a load problem
//! becomes `None`, a store problem becomes `false`, both are logged and
//! neither ever stops the arena from starting.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;

pub use codec::{decode_record, encode_record, ENCODED_LEN};
pub use error::CacheError;
pub use file::FileSizeStore;
pub use memory::MemorySizeStore;
