//! Error types for the size-cache stores.

use std::fmt;
use std::io;

/// Errors that can occur while reading or writing a size record.
///
/// These never escape a [`tarn_core::SizeStore`] implementation: loads
/// collapse to `None` and stores to `false`, with the detail logged.
/// They are public so direct users of the codec can tell a short file
/// from an I/O failure.
#[derive(Debug)]
pub enum CacheError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The input ended before a whole record was read.
    Truncated {
        /// Bytes a whole record requires.
        expected: usize,
        /// Bytes actually present.
        found: usize,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Truncated { expected, found } => {
                write!(f, "truncated record: expected {expected} bytes, found {found}")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CacheError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
