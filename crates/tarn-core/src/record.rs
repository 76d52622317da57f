//! The persisted size record and the store contract it travels through.
//!
//! The arena reads one [`SizeRecord`] at startup to decide how large its
//! buffer and regions should be, and rewrites it when the stored copy is
//! absent, corrupt, or version-mismatched. File layout and paths belong
//! to the store implementation (`tarn-cache`), never to the arena.

use crate::id::AppId;

/// Previously observed arena sizes, persisted across process runs.
///
/// One entry per region plus the whole-buffer total. A record written by
/// a different engine version is never interpreted — readers fall back
/// to the compiled-in defaults and rewrite the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeRecord {
    /// Record format version. Must equal [`SizeRecord::CURRENT_VERSION`]
    /// for the size fields to be trusted.
    pub version: u32,
    /// Total buffer size observed in the recorded run, in bytes.
    pub total: u64,
    /// Usable capacity of the static region, in bytes.
    pub static_size: u64,
    /// Usable capacity of the dynamic region, in bytes.
    pub dynamic_size: u64,
}

impl SizeRecord {
    /// Version written by this build. Bump when the layout or the meaning
    /// of any size field changes.
    pub const CURRENT_VERSION: u32 = 2;

    /// Default static-region capacity for a first run.
    pub const DEFAULT_STATIC_SIZE: u64 = 2_144;

    /// Default dynamic-region capacity for a first run.
    pub const DEFAULT_DYNAMIC_SIZE: u64 = 0;

    /// Whether this record was written by the current version.
    pub fn matches_current(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}

impl Default for SizeRecord {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            total: Self::DEFAULT_STATIC_SIZE + Self::DEFAULT_DYNAMIC_SIZE,
            static_size: Self::DEFAULT_STATIC_SIZE,
            dynamic_size: Self::DEFAULT_DYNAMIC_SIZE,
        }
    }
}

/// Storage contract for size records.
///
/// The arena is the only consumer: it loads one record at startup and
/// stores one when the loaded copy was unusable or when asked to persist
/// observed sizes. Implementations own file layout, paths, and error
/// reporting.
pub trait SizeStore {
    /// Load the record for `id`.
    ///
    /// Returns `None` when the record is missing or unreadable (I/O
    /// error, short read, garbage). Version checking is the caller's
    /// concern: a well-formed record with a stale version is returned
    /// as-is.
    fn load(&self, id: AppId) -> Option<SizeRecord>;

    /// Persist the record for `id`, returning whether the write stuck.
    ///
    /// Best-effort: a failed store only means the next run falls back to
    /// defaults again. Implementations must not panic on I/O failure.
    fn store(&self, id: AppId, record: &SizeRecord) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_current_version() {
        assert!(SizeRecord::default().matches_current());
    }

    #[test]
    fn default_sizes() {
        let r = SizeRecord::default();
        assert_eq!(r.static_size, 2_144);
        assert_eq!(r.dynamic_size, 0);
        assert_eq!(r.total, 2_144);
    }

    #[test]
    fn stale_version_detected() {
        let r = SizeRecord {
            version: SizeRecord::CURRENT_VERSION - 1,
            ..SizeRecord::default()
        };
        assert!(!r.matches_current());
    }
}
