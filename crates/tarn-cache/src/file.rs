//! File-backed size-record store.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use tarn_core::{AppId, SizeRecord, SizeStore};

use crate::codec::{decode_record, encode_record};

/// Stores one `engine.cache` file per application id under a root
/// directory: `<root>/<id>/engine.cache`.
///
/// The per-id subdirectory doubles as the application's save namespace,
/// so colliding ids share save data too — a known limitation of the
/// name hash.
///
/// All I/O is soft-fail: a missing file loads as `None` silently, any
/// other problem is logged at `warn` and reported as `None`/`false`.
pub struct FileSizeStore {
    root: PathBuf,
}

impl FileSizeStore {
    /// Store rooted at `root`. Nothing is created until the first
    /// [`SizeStore::store`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform cache root for an engine directory name, if one can be
    /// resolved from the environment.
    ///
    /// Tries `LOCALAPPDATA` (Windows), then `XDG_CACHE_HOME`, then
    /// `HOME/.cache`.
    pub fn default_root(engine_dir: &str) -> Option<PathBuf> {
        let base = env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .or_else(|| env::var_os("XDG_CACHE_HOME").map(PathBuf::from))
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
        Some(base.join(engine_dir))
    }

    /// The root directory this store reads and writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `id`.
    pub fn record_path(&self, id: AppId) -> PathBuf {
        self.root.join(id.to_string()).join("engine.cache")
    }
}

impl SizeStore for FileSizeStore {
    fn load(&self, id: AppId) -> Option<SizeRecord> {
        let path = self.record_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("save: failed to read {}: {e}", path.display());
                }
                return None;
            }
        };
        match decode_record(&bytes) {
            Ok(record) => {
                info!("save: opened {}", path.display());
                Some(record)
            }
            Err(e) => {
                warn!("save: {}: {e}", path.display());
                None
            }
        }
    }

    fn store(&self, id: AppId, record: &SizeRecord) -> bool {
        let path = self.record_path(id);
        let dir = match path.parent() {
            Some(dir) => dir,
            None => return false,
        };
        if let Err(e) = fs::create_dir_all(dir) {
            warn!("save: failed to create {}: {e}", dir.display());
            return false;
        }
        if let Err(e) = fs::write(&path, encode_record(record)) {
            warn!("save: failed to write {}: {e}", path.display());
            return false;
        }
        info!("save: wrote {}", path.display());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_record_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSizeStore::new(dir.path());
        assert!(store.load(AppId(1)).is_none());
    }

    #[test]
    fn store_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSizeStore::new(dir.path());
        let id = AppId::from_name("APP");
        let record = SizeRecord {
            version: SizeRecord::CURRENT_VERSION,
            total: 4_096,
            static_size: 2_144,
            dynamic_size: 512,
        };
        assert!(store.store(id, &record));
        assert!(store.record_path(id).is_file());
        assert_eq!(store.load(id), Some(record));
    }

    #[test]
    fn truncated_record_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSizeStore::new(dir.path());
        let id = AppId(7);
        store.store(id, &SizeRecord::default());
        let path = store.record_path(id);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();
        assert!(store.load(id).is_none());
    }

    #[test]
    fn ids_do_not_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSizeStore::new(dir.path());
        let a = SizeRecord {
            static_size: 111,
            ..SizeRecord::default()
        };
        let b = SizeRecord {
            static_size: 222,
            ..SizeRecord::default()
        };
        store.store(AppId(1), &a);
        store.store(AppId(2), &b);
        assert_eq!(store.load(AppId(1)).unwrap().static_size, 111);
        assert_eq!(store.load(AppId(2)).unwrap().static_size, 222);
    }

    #[test]
    fn unwritable_root_is_soft() {
        // A root that is a *file* cannot gain subdirectories.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let store = FileSizeStore::new(&blocker);
        assert!(!store.store(AppId(1), &SizeRecord::default()));
    }
}
