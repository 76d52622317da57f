//! In-memory size-record store.

use std::cell::RefCell;

use indexmap::IndexMap;

use tarn_core::{AppId, SizeRecord, SizeStore};

/// A [`SizeStore`] backed by an in-process map.
///
/// For tests and for embedders with no persistent storage — every run
/// starts from defaults, which is exactly the contract's soft-fail
/// behavior. Interior mutability keeps the `SizeStore` methods on
/// `&self`, like the file store's.
#[derive(Default)]
pub struct MemorySizeStore {
    records: RefCell<IndexMap<AppId, SizeRecord>>,
}

impl MemorySizeStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record currently held for `id`, if any.
    pub fn get(&self, id: AppId) -> Option<SizeRecord> {
        self.records.borrow().get(&id).copied()
    }

    /// Pre-seed a record, replacing any existing one.
    pub fn insert(&self, id: AppId, record: SizeRecord) {
        self.records.borrow_mut().insert(id, record);
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl SizeStore for MemorySizeStore {
    fn load(&self, id: AppId) -> Option<SizeRecord> {
        self.get(id)
    }

    fn store(&self, id: AppId, record: &SizeRecord) -> bool {
        self.insert(id, *record);
        true
    }
}
