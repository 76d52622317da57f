//! Arena sizing configuration.

use tarn_core::SizeRecord;

/// Sizes for the arena's fixed-purpose regions.
///
/// Usually derived from the persisted [`SizeRecord`] for the
/// application; [`ArenaConfig::default`] mirrors the record's
/// compiled-in defaults so a first run and a fallback run agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Usable capacity of the static region in bytes.
    pub static_size: usize,
    /// Usable capacity of the dynamic region in bytes.
    pub dynamic_size: usize,
    /// Lower bound for the whole buffer, from the last observed run.
    ///
    /// The arena allocates `max(total_hint, layout minimum)`; a stale or
    /// zero hint never shrinks the arena below what the regions require.
    pub total_hint: usize,
}

impl ArenaConfig {
    /// Config with explicit region sizes and no total hint.
    pub fn new(static_size: usize, dynamic_size: usize) -> Self {
        Self {
            static_size,
            dynamic_size,
            total_hint: 0,
        }
    }

    /// Config from a persisted record. The caller has already verified
    /// the record's version.
    pub fn from_record(record: &SizeRecord) -> Self {
        Self {
            static_size: record.static_size as usize,
            dynamic_size: record.dynamic_size as usize,
            total_hint: record.total as usize,
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::from_record(&SizeRecord::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mirrors_record_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.static_size, 2_144);
        assert_eq!(config.dynamic_size, 0);
        assert_eq!(config.total_hint, 2_144);
    }

    #[test]
    fn from_record_copies_all_sizes() {
        let record = SizeRecord {
            version: SizeRecord::CURRENT_VERSION,
            total: 8_192,
            static_size: 1_024,
            dynamic_size: 4_096,
        };
        let config = ArenaConfig::from_record(&record);
        assert_eq!(config.static_size, 1_024);
        assert_eq!(config.dynamic_size, 4_096);
        assert_eq!(config.total_hint, 8_192);
    }
}
